/*!
 * # Editing Core
 *
 * Client-side state of the block editor: the ordered block list of one
 * document plus selection, type menu and undo history.
 *
 * ## Architecture Overview
 *
 * ### 1. Single owned store
 * - **`BlockStore`** holds the blocks, the focused block key, the type menu
 *   and the bounded history
 * - Mutations are synchronous and free of I/O; the persistence layer only
 *   ever observes their results
 * - Operations on keys that no longer exist are no-ops
 *
 * ### 2. Two-phase block identity
 * - New blocks get a **`BlockKey::Provisional`** key
 * - When the remote create resolves, `BlockStore::rekey` rewrites the key in
 *   the list, the focus pointer and every history snapshot
 *
 * ### 3. Input as data
 * - Front ends translate native key events into **`KeyEvent`**
 * - `input::interpret` maps them to an **`EditorAction`**, which the session
 *   executes
 * - Drag gestures go through **`DragCoordinator`** and end as a key
 *   permutation for `BlockStore::reorder`
 *
 * ### 4. Render model
 * - `view::block_views` yields one **`BlockView`** per block
 * - The focused block carries no `sync_text`, so its live editing node is
 *   never overwritten
 *
 * ## Module Structure
 *
 * - **`block`**: `Block`, `BlockKey`, `BlockKind`, `BlockContent`, `BlockPatch`
 * - **`store`**: `BlockStore`
 * - **`history`**: bounded undo/redo stacks
 * - **`menu`**: the "/" type-conversion menu state machine
 * - **`input`**: key binding table
 * - **`drag`**: drag activation threshold and drop permutation
 * - **`view`**: render model
 *
 * ## Usage Pattern
 *
 * ```rust
 * use blockpad_engine::editing::*;
 *
 * let mut store = BlockStore::new();
 * store.set_blocks(vec![Block::new(BlockKind::Paragraph, 0)]);
 * let first = store.keys()[0];
 *
 * store.update_block(first, BlockPatch::text("Hello"));
 * let second = store.insert_block(first, BlockKind::Paragraph).unwrap();
 * store.select_block(Some(second));
 *
 * assert_eq!(store.blocks()[0].text(), "Hello");
 * assert!(store.undo());
 * ```
 */

pub mod block;
pub mod drag;
pub mod history;
pub mod input;
pub mod menu;
pub mod store;
pub mod view;

pub use block::*;
pub use drag::{DragCoordinator, DragState, Point, move_key};
pub use history::History;
pub use input::{EditorAction, Key, KeyContext, KeyEvent, KeyOutcome, Modifiers};
pub use menu::{MENU_OPTIONS, MenuAnchor, MenuMode, MenuOption, MenuState, TypeMenu};
pub use store::BlockStore;
pub use view::{BlockView, block_views};
