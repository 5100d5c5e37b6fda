// Common trait for action and observation spaces.

use rand::Rng;

/// Describes the legal values an environment accepts or produces.
/// `Element` is the value type living in the space: `[f32; 2]` for the
/// steering box, `Image` for camera frames.
pub trait Space {
    type Element;

    /// Dimensions of an element, outermost first.
    fn shape(&self) -> Vec<usize>;

    /// Draw a sample from the space using the provided RNG.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element;

    /// Return true if the given element is a valid member of the space.
    fn contains(&self, elem: &Self::Element) -> bool;
}
