use super::*;

#[test]
fn test_from_vec_valid() {
    let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("matrix");
    assert_eq!(m.shape(), (2, 2));
    assert_eq!(m.get(0, 0), 1.0);
    assert_eq!(m.get(1, 1), 4.0);
}

#[test]
fn test_from_vec_wrong_length() {
    let result = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0]);
    assert!(result.is_err());
    let msg = result.unwrap_err().to_string();
    assert!(msg.contains("Dimension mismatch"), "got: {msg}");
}

#[test]
fn test_from_rows() {
    let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).expect("matrix");
    assert_eq!(m.shape(), (3, 2));
    assert_eq!(m.row(1), &[3.0, 4.0]);
}

#[test]
fn test_from_rows_ragged_fails() {
    let result = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
    assert!(result.is_err());
}

#[test]
fn test_from_rows_empty() {
    let m = Matrix::from_rows(&[]).expect("matrix");
    assert_eq!(m.shape(), (0, 0));
}

#[test]
fn test_zeros() {
    let m = Matrix::zeros(3, 4);
    assert_eq!(m.shape(), (3, 4));
    assert!(m.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn test_set_get() {
    let mut m = Matrix::zeros(2, 2);
    m.set(1, 0, 7.5);
    assert_eq!(m.get(1, 0), 7.5);
}

#[test]
fn test_select_rows() {
    let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).expect("matrix");
    let sub = m.select_rows(&[2, 0]);
    assert_eq!(sub.shape(), (2, 2));
    assert_eq!(sub.row(0), &[5.0, 6.0]);
    assert_eq!(sub.row(1), &[1.0, 2.0]);
}

#[test]
fn test_select_rows_with_repeats() {
    let m = Matrix::from_rows(&[vec![1.0], vec![2.0]]).expect("matrix");
    let sub = m.select_rows(&[1, 1, 0]);
    assert_eq!(sub.n_rows(), 3);
    assert_eq!(sub.get(0, 0), 2.0);
    assert_eq!(sub.get(1, 0), 2.0);
    assert_eq!(sub.get(2, 0), 1.0);
}
