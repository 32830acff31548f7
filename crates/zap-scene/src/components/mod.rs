pub mod animator;
pub mod drawable;
pub mod mesh;
pub mod node;
pub mod shape;
pub mod sprite;
pub mod text;

pub use animator::{Animator, Easing, Parallel, Sequence, Tween, TweenLoop, TweenTarget};
pub use drawable::{DrawContext, Drawable};
pub use mesh::StaticMeshRenderer;
pub use node::{DrawableSlot, Node};
pub use shape::ShapeRenderer;
pub use sprite::{Sprite, SpriteEvent};
pub use text::TextRenderer;
