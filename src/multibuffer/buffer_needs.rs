/// The largest root of `size` that fits in the available buffers: the
/// smallest k with size^(1/i) <= available for some number of passes i.
/// Two buffers are held back for the input and output scans.
pub fn best_root(available: i32, size: i32) -> i32 {
    let avail = available - 2;
    if avail <= 1 {
        return 1;
    }
    let mut k = i32::MAX;
    let mut i = 1.0;
    while k > avail {
        i += 1.0;
        k = (size as f64).powf(1.0 / i).ceil() as i32;
    }
    k
}

/// The largest factor of `size` that fits in the available buffers.
pub fn best_factor(available: i32, size: i32) -> i32 {
    let avail = available - 2;
    if avail <= 1 {
        return 1;
    }
    let mut k = size;
    let mut i = 1.0;
    while k > avail {
        i += 1.0;
        k = ((size as f64) / i).ceil() as i32;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_root() {
        // 1000 blocks in 12 usable buffers: 1000^(1/3) = 10
        assert_eq!(best_root(14, 1000), 10);
        assert_eq!(best_root(3, 100), 1);
        // even with room to spare, at least a square root is taken
        assert_eq!(best_root(102, 100), 10);
    }

    #[test]
    fn test_best_factor() {
        assert_eq!(best_factor(14, 24), 12);
        assert_eq!(best_factor(14, 12), 12);
        assert_eq!(best_factor(3, 100), 1);
    }
}
