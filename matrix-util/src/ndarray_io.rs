use crate::common_io::{read_lines_of_types, write_lines, Delimiter};
use crate::traits::IoOps;
use ndarray::prelude::*;
use std::fmt::Display;
use std::str::FromStr;

impl<T> IoOps for Array2<T>
where
    T: FromStr + Send + Display,
    <T as FromStr>::Err: Display,
{
    type Scalar = T;
    type Mat = Self;

    /// One line per row; every line must have the same number of fields
    fn read_file_delim(file: &str, delim: impl Into<Delimiter>) -> anyhow::Result<Self::Mat> {
        let rows = read_lines_of_types::<T>(file, delim)?;

        if rows.is_empty() {
            return Err(anyhow::anyhow!("No data in file {}", file));
        }

        let nrows = rows.len();
        let ncols = rows[0].len();

        if let Some((i, _)) = rows.iter().enumerate().find(|(_, x)| x.len() != ncols) {
            anyhow::bail!(
                "{}: row {} has {} fields, expected {}",
                file,
                i + 1,
                rows[i].len(),
                ncols
            );
        }

        let data = rows.into_iter().flatten().collect::<Vec<_>>();
        Ok(Array2::from_shape_vec((nrows, ncols), data)?)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = self
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(|x| format!("{}", *x))
                    .collect::<Vec<String>>()
                    .join(delim)
                    .into_boxed_str()
            })
            .collect();
        write_lines(&lines, file)?;
        Ok(())
    }
}
