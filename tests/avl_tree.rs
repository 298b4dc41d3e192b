use std::collections::BTreeSet;

use avl_index::{
    Arena, AvlTree, Direction, Error, Handle, Keyed, Linked, Links, PathBuffer, max_height, path_buffer,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The number of elements in the large deterministic workloads.
const TEST_SIZE: usize = 100_000;

#[derive(Debug)]
struct Item {
    links: Links,
    key: i64,
}

impl Item {
    fn new(key: i64) -> Self {
        Item { links: Links::new(), key }
    }
}

impl Linked for Item {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

impl Keyed for Item {
    type Key = i64;

    fn key(&self) -> &i64 {
        &self.key
    }
}

/// An arena, the tree over it and a path buffer.
struct Fixture {
    arena: Arena<Item>,
    tree: AvlTree<Item>,
    buf: PathBuffer,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            arena: Arena::new(),
            tree: AvlTree::new(),
            buf: path_buffer(),
        }
    }

    fn with(keys: &[i64]) -> Self {
        let mut fixture = Fixture::new();
        for &key in keys {
            fixture.add(key).unwrap();
        }
        fixture
    }

    fn add(&mut self, key: i64) -> Result<Handle, Error> {
        let handle = self.arena.insert(Item::new(key));
        match self.tree.insert(&mut self.arena, handle, &mut self.buf) {
            Ok(()) => Ok(handle),
            Err(error) => {
                self.arena.remove(handle);
                Err(error)
            }
        }
    }

    fn delete(&mut self, key: i64) -> Result<Item, Error> {
        let handle = self.tree.remove(&mut self.arena, &key, &mut self.buf)?;
        Ok(self.arena.remove(handle).unwrap())
    }

    fn root_key(&self) -> Option<i64> {
        self.tree.root().map(|h| self.arena[h].key)
    }

    fn height(&self) -> usize {
        let height = self.tree.verify(&self.arena).unwrap();
        assert_eq!(self.tree.height(&self.arena), height);
        height
    }

    /// Renders the tree as `key[balance](left,right)`, with `-` for an empty child.
    fn shape(&self) -> String {
        self.shape_of(self.tree.root())
    }

    fn shape_of(&self, node: Option<Handle>) -> String {
        let Some(handle) = node else {
            return String::from("-");
        };
        let item = &self.arena[handle];
        let links = item.links();
        if links.is_leaf() {
            format!("{}[{}]", item.key, links.balance())
        } else {
            format!(
                "{}[{}]({},{})",
                item.key,
                links.balance(),
                self.shape_of(links.left()),
                self.shape_of(links.right())
            )
        }
    }

    fn keys(&self) -> Vec<i64> {
        self.tree.iter(&self.arena).map(|(_, item)| item.key).collect()
    }
}

// ─── Fixed shapes ────────────────────────────────────────────────────────────

#[test]
fn three_ascending_keys_rotate_to_middle_root() {
    let fixture = Fixture::with(&[1, 2, 3]);
    assert_eq!(fixture.root_key(), Some(2));
    assert_eq!(fixture.height(), 2);
    assert_eq!(fixture.shape(), "2[0](1[0],3[0])");
}

#[test]
fn ten_ascending_keys() {
    let fixture = Fixture::with(&(0..10).collect::<Vec<_>>());
    assert_eq!(fixture.root_key(), Some(3));
    assert_eq!(fixture.height(), 4);
    assert_eq!(fixture.shape(), "3[1](1[0](0[0],2[0]),7[0](5[0](4[0],6[0]),8[1](-,9[0])))");
}

#[test]
fn interleaved_inserts_and_removals() {
    let mut fixture = Fixture::with(&[1, 9, 2, 8, 3, 7]);
    assert_eq!((fixture.root_key(), fixture.height()), (Some(3), 3));

    fixture.delete(3).unwrap();
    assert_eq!((fixture.root_key(), fixture.height()), (Some(2), 3));

    fixture.delete(2).unwrap();
    assert_eq!((fixture.root_key(), fixture.height()), (Some(8), 3));

    fixture.add(5).unwrap();
    assert_eq!(fixture.shape(), "8[-1](5[0](1[0],7[0]),9[0])");

    fixture.add(10).unwrap();
    fixture.add(6).unwrap();
    assert_eq!((fixture.root_key(), fixture.height()), (Some(8), 4));

    fixture.delete(8).unwrap();
    assert_eq!((fixture.root_key(), fixture.height()), (Some(7), 3));

    fixture.delete(9).unwrap();
    fixture.delete(10).unwrap();
    assert_eq!((fixture.root_key(), fixture.height()), (Some(5), 3));

    fixture.delete(1).unwrap();
    assert_eq!((fixture.root_key(), fixture.height()), (Some(6), 2));

    fixture.delete(5).unwrap();
    fixture.delete(6).unwrap();
    assert_eq!((fixture.root_key(), fixture.height()), (Some(7), 1));

    fixture.delete(7).unwrap();
    assert_eq!(fixture.tree.len(), 0);
    assert_eq!(fixture.tree.root(), None);
    assert_eq!(fixture.height(), 0);
}

#[test]
fn removals_from_a_perfect_tree() {
    let mut fixture = Fixture::with(&[1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(fixture.shape(), "4[0](2[0](1[0],3[0]),6[0](5[0],7[0]))");

    fixture.delete(4).unwrap();
    assert_eq!(fixture.shape(), "3[0](2[-1](1[0],-),6[0](5[0],7[0]))");

    fixture.delete(3).unwrap();
    assert_eq!(fixture.shape(), "2[1](1[0],6[0](5[0],7[0]))");

    fixture.delete(2).unwrap();
    assert_eq!(fixture.shape(), "6[-1](1[1](-,5[0]),7[0])");

    fixture.delete(6).unwrap();
    assert_eq!(fixture.shape(), "5[0](1[0],7[0])");
}

#[test]
fn removal_rebalances_through_the_root() {
    let mut fixture = Fixture::with(&[5, 2, 8, 1, 3, 7, 10, 4, 6, 9, 11, 12]);
    assert_eq!(
        fixture.shape(),
        "5[1](2[1](1[0],3[1](-,4[0])),8[1](7[-1](6[0],-),10[1](9[0],11[1](-,12[0]))))"
    );

    fixture.delete(1).unwrap();
    assert_eq!(
        fixture.shape(),
        "8[0](5[0](3[0](2[0],4[0]),7[-1](6[0],-)),10[1](9[0],11[1](-,12[0])))"
    );
}

#[test]
fn removal_sequence_with_double_rotations() {
    let mut fixture =
        Fixture::with(&[74, 0, 71, 47, 76, 82, 25, 50, 68, 17, 29, 98, 48, 14, 97, 28, 43, 89, 58, 3, 13]);
    let balance = |fixture: &Fixture, key: i64| {
        let handle = fixture.tree.get(&fixture.arena, &key).unwrap();
        fixture.arena[handle].links().balance()
    };

    assert_eq!(fixture.root_key(), Some(50));
    assert_eq!((balance(&fixture, 50), balance(&fixture, 25), balance(&fixture, 76)), (0, 0, 0));

    fixture.delete(98).unwrap();
    assert_eq!(balance(&fixture, 76), -1);

    fixture.delete(58).unwrap();
    assert_eq!((balance(&fixture, 50), balance(&fixture, 76)), (-1, 0));

    fixture.delete(29).unwrap();
    assert_eq!((balance(&fixture, 50), balance(&fixture, 25)), (-1, 0));

    fixture.delete(47).unwrap();
    assert_eq!(balance(&fixture, 25), -1);

    for key in [3, 50, 68] {
        fixture.delete(key).unwrap();
    }
    assert_eq!(fixture.root_key(), Some(48));
    assert_eq!((balance(&fixture, 48), balance(&fixture, 25), balance(&fixture, 76)), (-1, -1, 0));
    assert_eq!(
        fixture.shape(),
        "48[-1](25[-1](14[-1](0[1](-,13[0]),17[0]),43[-1](28[0],-)),76[0](71[1](-,74[0]),89[0](82[0],97[0])))"
    );
}

// ─── Contract ────────────────────────────────────────────────────────────────

#[test]
fn duplicate_keys_are_rejected() {
    let mut fixture = Fixture::new();
    let first = fixture.add(42).unwrap();
    assert_eq!(fixture.add(42), Err(Error::DuplicateKey(first)));
    assert_eq!(fixture.tree.len(), 1);
}

#[test]
fn remove_returns_the_inserted_object_with_reset_links() {
    let mut fixture = Fixture::with(&[10, 20, 30, 40]);
    let handle = fixture.add(25).unwrap();
    let len = fixture.tree.len();

    let removed = fixture.tree.remove(&mut fixture.arena, &25, &mut fixture.buf).unwrap();
    assert_eq!(removed, handle);
    assert_eq!(*fixture.arena[removed].links(), Links::new());
    assert_eq!(fixture.tree.len(), len - 1);
    assert_eq!(fixture.delete(25).err(), Some(Error::NotFound));
}

#[test]
fn lookups_do_not_change_generation() {
    let mut fixture = Fixture::with(&[3, 1, 2]);
    let generation = fixture.tree.generation();
    let two = fixture.tree.get(&fixture.arena, &2);
    assert!(two.is_some());
    assert_eq!(fixture.tree.get(&fixture.arena, &2), two);
    assert_eq!(fixture.arena[two.unwrap()].key, 2);
    assert!(fixture.tree.contains(&fixture.arena, &2));
    assert!(fixture.tree.get(&fixture.arena, &7).is_none());
    let _ = fixture.tree.first(&fixture.arena);
    let _ = fixture.keys();
    assert_eq!(fixture.tree.generation(), generation);

    assert!(fixture.add(3).is_err());
    assert!(fixture.delete(9).is_err());
    assert_eq!(fixture.tree.generation(), generation);

    fixture.add(4).unwrap();
    assert_ne!(fixture.tree.generation(), generation);
}

#[test]
fn too_small_buffer_leaves_tree_unchanged() {
    let mut fixture = Fixture::with(&(0..1000).collect::<Vec<_>>());
    let before = fixture.shape();
    let generation = fixture.tree.generation();
    let mut tiny = [None; 4];

    let extra = fixture.arena.insert(Item::new(5000));
    assert_eq!(
        fixture.tree.insert(&mut fixture.arena, extra, &mut tiny),
        Err(Error::StackOverflow { capacity: 4 })
    );
    assert_eq!(
        fixture.tree.remove(&mut fixture.arena, &999, &mut tiny),
        Err(Error::StackOverflow { capacity: 4 })
    );
    assert_eq!(fixture.shape(), before);
    assert_eq!(fixture.tree.generation(), generation);

    // A buffer sized from the length bound is always enough.
    let mut sized = vec![None; max_height(fixture.tree.len() + 1)];
    fixture.tree.insert(&mut fixture.arena, extra, &mut sized).unwrap();
    assert_eq!(fixture.tree.len(), 1001);
    fixture.height();
}

#[test]
fn first_and_last() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.tree.first(&fixture.arena), None);
    for key in [50, -3, 17, 99, 0] {
        fixture.add(key).unwrap();
    }
    let first = fixture.tree.first(&fixture.arena).unwrap();
    let last = fixture.tree.last(&fixture.arena).unwrap();
    assert_eq!((fixture.arena[first].key, fixture.arena[last].key), (-3, 99));
}

// ─── Iteration ───────────────────────────────────────────────────────────────

#[test]
fn cursors_walk_both_directions() {
    let fixture = Fixture::with(&[8, 4, 12, 2, 6, 10, 14, 1]);
    let mut forward = Vec::new();
    let mut backward = Vec::new();

    let mut buf = path_buffer();
    let mut cursor = fixture.tree.cursor(&fixture.arena, Direction::Forward, &mut buf).unwrap();
    while let Some(h) = cursor.next(&fixture.tree, &fixture.arena).unwrap() {
        forward.push(fixture.arena[h].key);
    }

    let mut buf = path_buffer();
    let mut cursor = fixture.tree.cursor(&fixture.arena, Direction::Backward, &mut buf).unwrap();
    while let Some(h) = cursor.next(&fixture.tree, &fixture.arena).unwrap() {
        backward.push(fixture.arena[h].key);
    }

    assert_eq!(forward, [1, 2, 4, 6, 8, 10, 12, 14]);
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn cursor_is_invalidated_by_insert() {
    let mut fixture = Fixture::with(&[1, 2, 3]);
    let mut buf = path_buffer();
    let mut cursor = fixture.tree.cursor(&fixture.arena, Direction::Forward, &mut buf).unwrap();
    assert!(cursor.next(&fixture.tree, &fixture.arena).unwrap().is_some());

    fixture.add(4).unwrap();
    assert_eq!(cursor.next(&fixture.tree, &fixture.arena), Err(Error::Invalidated));
}

// ─── Large workloads ─────────────────────────────────────────────────────────

#[test]
fn random_keys_stay_within_height_bound() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut fixture = Fixture::new();
    let mut model = BTreeSet::new();

    for _ in 0..TEST_SIZE {
        let key = rng.gen_range(0..1_000_000);
        match fixture.add(key) {
            Ok(_) => assert!(model.insert(key)),
            Err(Error::DuplicateKey(_)) => {
                // A repeated key removes the original instead.
                assert_eq!(fixture.delete(key).unwrap().key, key);
                assert!(model.remove(&key));
            }
            Err(error) => panic!("unexpected error: {error}"),
        }
    }

    let len = fixture.tree.len();
    assert_eq!(len, model.len());
    let height = fixture.height();
    #[allow(clippy::cast_precision_loss)]
    let bound = 1.44 * (len as f64).log2();
    #[allow(clippy::cast_precision_loss)]
    let height_f = height as f64;
    assert!(height_f < bound, "height {height} exceeds {bound}");
    assert!(height <= max_height(len));
    assert!(fixture.keys().into_iter().eq(model.iter().copied()));

    // Drain in random order, checking the structure as it shrinks.
    let mut remaining: Vec<i64> = model.into_iter().collect();
    let mut step = 0;
    while !remaining.is_empty() {
        let key = remaining.swap_remove(rng.gen_range(0..remaining.len()));
        fixture.delete(key).unwrap();
        step += 1;
        if step % 10_000 == 0 {
            fixture.height();
        }
    }
    assert!(fixture.tree.is_empty());
    assert_eq!(fixture.height(), 0);
}

#[test]
fn ascending_keys_build_a_near_perfect_tree() {
    let mut fixture = Fixture::new();
    for key in 0..TEST_SIZE as i64 {
        fixture.add(key).unwrap();
    }
    assert_eq!(fixture.tree.len(), TEST_SIZE);
    assert_eq!(fixture.height(), 17);

    let mut expected = 0;
    while let Ok(handle) = fixture.tree.pop_first(&mut fixture.arena, &mut fixture.buf) {
        assert_eq!(fixture.arena.remove(handle).unwrap().key, expected);
        expected += 1;
    }
    assert_eq!(expected, TEST_SIZE as i64);
    assert_eq!(fixture.height(), 0);
}

// ─── Randomized ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum TreeOp {
    Insert(i64),
    Remove(i64),
    RemoveHandle(usize),
    PopFirst,
    PopLast,
}

fn tree_op_strategy() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        6 => (-2_000i64..2_000).prop_map(TreeOp::Insert),
        3 => (-2_000i64..2_000).prop_map(TreeOp::Remove),
        2 => any::<usize>().prop_map(TreeOp::RemoveHandle),
        1 => Just(TreeOp::PopFirst),
        1 => Just(TreeOp::PopLast),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays random operations on the tree and a `BTreeSet` and checks that the
    /// tree stays a valid AVL tree with the same contents.
    #[test]
    fn tree_ops_match_btreeset(ops in proptest::collection::vec(tree_op_strategy(), 2_000)) {
        let mut fixture = Fixture::new();
        let mut model = BTreeSet::new();
        let mut linked: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                TreeOp::Insert(key) => {
                    let result = fixture.add(key);
                    prop_assert_eq!(result.is_ok(), model.insert(key));
                    if let Ok(handle) = result {
                        linked.push(handle);
                    }
                }
                TreeOp::Remove(key) => {
                    let result = fixture.tree.remove(&mut fixture.arena, &key, &mut fixture.buf);
                    prop_assert_eq!(result.is_ok(), model.remove(&key));
                    if let Ok(handle) = result {
                        linked.retain(|&h| h != handle);
                        fixture.arena.remove(handle);
                    }
                }
                TreeOp::RemoveHandle(which) => {
                    if linked.is_empty() {
                        continue;
                    }
                    let handle = linked.swap_remove(which % linked.len());
                    fixture.tree.remove_handle(&mut fixture.arena, handle, &mut fixture.buf).unwrap();
                    let item = fixture.arena.remove(handle).unwrap();
                    prop_assert!(model.remove(&item.key));
                }
                TreeOp::PopFirst | TreeOp::PopLast => {
                    let result = if matches!(op, TreeOp::PopFirst) {
                        fixture.tree.pop_first(&mut fixture.arena, &mut fixture.buf)
                    } else {
                        fixture.tree.pop_last(&mut fixture.arena, &mut fixture.buf)
                    };
                    let expected = if matches!(op, TreeOp::PopFirst) { model.pop_first() } else { model.pop_last() };
                    match result {
                        Ok(handle) => {
                            linked.retain(|&h| h != handle);
                            prop_assert_eq!(Some(fixture.arena.remove(handle).unwrap().key), expected);
                        }
                        Err(error) => {
                            prop_assert_eq!(error, Error::NotFound);
                            prop_assert_eq!(expected, None);
                        }
                    }
                }
            }

            let height = fixture.tree.verify(&fixture.arena);
            prop_assert!(height.is_ok(), "{:?}", height);
            prop_assert!(height.unwrap() <= max_height(fixture.tree.len()));
        }

        prop_assert_eq!(fixture.keys(), model.into_iter().collect::<Vec<_>>());
    }
}
