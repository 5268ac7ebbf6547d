use matrix_util::traits::{IoOps, SampleOps};
use rand::SeedableRng;

#[test]
fn ndarray_io_test() -> anyhow::Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let xx = ndarray::Array2::<f64>::runif_with(20, 7, &mut rng);

    let dir = tempfile::tempdir()?;
    let tsv_file = dir.path().join("xx.txt.gz");
    xx.to_tsv(tsv_file.to_str().unwrap())?;

    let yy = ndarray::Array2::<f64>::from_tsv(tsv_file.to_str().unwrap())?;

    assert_eq!(xx.dim(), yy.dim());
    approx::assert_abs_diff_eq!(xx, yy, epsilon = 1e-12);

    Ok(())
}

#[test]
fn ndarray_io_ragged_rows_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tsv_file = dir.path().join("ragged.tsv");
    let lines: Vec<Box<str>> = vec!["1\t2\t3".into(), "4\t5".into()];
    matrix_util::common_io::write_lines(&lines, tsv_file.to_str().unwrap())?;

    assert!(ndarray::Array2::<f64>::from_tsv(tsv_file.to_str().unwrap()).is_err());
    Ok(())
}

#[test]
fn rgamma_is_reproducible_and_positive() -> anyhow::Result<()> {
    let shape = ndarray::Array2::<f64>::from_elem((3, 4), 2.0);
    let rate = ndarray::Array2::<f64>::from_elem((3, 4), 0.5);

    let mut rng1 = rand::rngs::StdRng::seed_from_u64(7);
    let mut rng2 = rand::rngs::StdRng::seed_from_u64(7);

    let x1 = ndarray::Array2::<f64>::rgamma_with(&shape, &rate, &mut rng1)?;
    let x2 = ndarray::Array2::<f64>::rgamma_with(&shape, &rate, &mut rng2)?;

    assert_eq!(x1, x2);
    assert!(x1.iter().all(|&x| x > 0.0));
    Ok(())
}

#[test]
fn rgamma_rejects_bad_parameters() {
    let shape = ndarray::Array2::<f64>::from_elem((1, 2), -1.0);
    let rate = ndarray::Array2::<f64>::from_elem((1, 2), 1.0);
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    assert!(ndarray::Array2::<f64>::rgamma_with(&shape, &rate, &mut rng).is_err());
}
