use blockpad_engine::editing::{Block, BlockKind, BlockPatch, BlockStore, move_key};
use rstest::rstest;

/// Small deterministic generator so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

fn assert_dense(store: &BlockStore) {
    assert!(!store.is_empty(), "store must never be empty");
    let orders: Vec<usize> = store.blocks().iter().map(|b| b.order).collect();
    let expected: Vec<usize> = (0..store.len()).collect();
    assert_eq!(orders, expected);
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(2024)]
fn test_random_edits_keep_orders_dense(#[case] seed: u64) {
    let mut rng = Lcg(seed);
    let mut store = BlockStore::new();
    store.set_blocks(vec![Block::new(BlockKind::Paragraph, 0)]);

    for step in 0..500 {
        let keys = store.keys();
        let key = keys[rng.next(keys.len())];
        match rng.next(6) {
            0 | 1 => {
                store.insert_block(key, BlockKind::Paragraph);
            }
            2 => {
                store.delete_block(key);
            }
            3 => {
                if let Some(sequence) = move_key(&keys, key, rng.next(keys.len())) {
                    assert!(store.reorder(&sequence));
                }
            }
            4 => {
                store.update_block(key, BlockPatch::text(format!("step {step}")));
            }
            _ => {
                if rng.next(2) == 0 {
                    store.undo();
                } else {
                    store.redo();
                }
            }
        }
        assert_dense(&store);
    }
}

#[test]
fn test_undo_everything_returns_to_start() {
    let mut store = BlockStore::new();
    store.set_blocks(vec![Block::new(BlockKind::Paragraph, 0)]);
    let start: Vec<_> = store.keys();

    let mut last = start[0];
    for i in 0..20 {
        last = store.insert_block(last, BlockKind::Paragraph).unwrap();
        store.update_block(last, BlockPatch::text(format!("line {i}")));
    }
    while store.undo() {}

    assert_eq!(store.keys(), start);
    assert!(store.can_redo());
}
