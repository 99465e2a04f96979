// partition.rs
// 分块器，负责将线性输入拆分为连续且大小近似相等的子块。

/// 将列表拆分为 n_block 个连续子块
///
/// 列表长度不小于块数时：前 len % n_block 个块大小为 ceil(len/n_block)，
/// 其余块大小为 floor(len/n_block)，各块大小最多相差1；
/// 列表长度小于块数时：每个元素单独成块，实际块数为列表长度。
/// 拆分是确定性且保序的，按顺序拼接所有子块可以精确还原输入。
///
/// 正常使用要求 n_block 不小于1；n_block 为0时不产生任何块，返回空列表
pub fn partition<T>(items: Vec<T>, n_block: usize) -> Vec<Vec<T>> {
    if n_block == 0 {
        return Vec::new();
    }
    let len = items.len();
    let mut it = items.into_iter();
    let mut blocks = Vec::new();

    if len >= n_block {
        let q_hi = (len + n_block - 1) / n_block;
        let q_lo = len / n_block;
        let n_hi = len % n_block;
        for i in 0..n_block {
            let size = if i < n_hi { q_hi } else { q_lo };
            blocks.push(it.by_ref().take(size).collect());
        }
    } else {
        for _ in 0..len {
            blocks.push(it.by_ref().take(1).collect());
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_partition_reconstructs_input() {
        for len in 1..=25usize {
            let items: Vec<usize> = (0..len).collect();
            for n_block in 1..=len {
                let blocks = partition(items.clone(), n_block);
                let rebuilt: Vec<usize> = blocks.into_iter().flatten().collect();
                assert_eq!(rebuilt, items);
            }
        }
    }

    #[test]
    fn test_partition_block_sizes() {
        for len in 1..=25usize {
            let items: Vec<usize> = (0..len).collect();
            for n_block in 1..=len {
                let blocks = partition(items.clone(), n_block);
                assert_eq!(blocks.len(), n_block);

                let q_hi = (len + n_block - 1) / n_block;
                let q_lo = len / n_block;
                let n_hi = len % n_block;
                let hi_count = blocks.iter().filter(|b| b.len() == q_hi).count();
                for block in &blocks {
                    assert!(block.len() == q_hi || block.len() == q_lo);
                }
                if q_hi != q_lo {
                    assert_eq!(hi_count, n_hi);
                }
            }
        }
    }

    #[test]
    fn test_partition_more_blocks_than_items() {
        let items = vec![10, 20, 30];
        let blocks = partition(items, 7);
        assert_eq!(blocks, vec![vec![10], vec![20], vec![30]]);
    }

    #[test]
    fn test_partition_zero_blocks_yields_nothing() {
        let items = vec![1, 2, 3];
        let blocks = partition(items, 0);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_partition_empty_input() {
        let items: Vec<u32> = Vec::new();
        let blocks = partition(items, 3);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_partition_single_block() {
        let items: Vec<u32> = (0..9).collect();
        let blocks = partition(items.clone(), 1);
        assert_eq!(blocks, vec![items]);
    }

    #[test]
    fn test_partition_random_sequences() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let len = rng.gen_range(1..200usize);
            let n_block = rng.gen_range(1..50usize);
            let items: Vec<u32> = (0..len).map(|_| rng.gen()).collect();

            let blocks = partition(items.clone(), n_block);
            let rebuilt: Vec<u32> = blocks.iter().flatten().copied().collect();
            assert_eq!(rebuilt, items);
            assert_eq!(blocks.len(), n_block.min(len));
        }
    }
}
