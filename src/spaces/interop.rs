//! Optional conversions to numeric backends.
//!
//! Everything here sits behind the `ndarray` and `nalgebra` features; the
//! crate itself only deals in `Image` and `[f32; 2]`.

// ndarray interop
#[cfg(feature = "ndarray")]
pub mod ndarray_impl {
    use ndarray::Array3;

    use crate::core::{GymError, Result};
    use crate::spaces::Image;

    impl Image {
        /// Copy the frame into an `(height, width, channels)` array.
        pub fn to_ndarray(&self) -> Result<Array3<u8>> {
            Array3::from_shape_vec(self.shape(), self.as_bytes().to_vec())
                .map_err(|e| GymError::InvalidObservation(format!("ndarray conversion: {e}")))
        }

        /// Build a frame from an `(height, width, channels)` array in any memory layout.
        pub fn from_ndarray(arr: &Array3<u8>) -> Result<Self> {
            let (h, w, c) = arr.dim();
            let data: Vec<u8> = arr.iter().copied().collect();
            Image::from_raw(h, w, c, data)
                .map_err(|e| GymError::InvalidObservation(format!("ndarray conversion: {e}")))
        }
    }

}

// nalgebra interop
#[cfg(feature = "nalgebra")]
pub mod nalgebra_impl {
    use nalgebra::Vector2;

    /// `(velocity, steering)` as a column vector.
    pub fn action_to_vector(action: [f32; 2]) -> Vector2<f32> {
        Vector2::new(action[0], action[1])
    }

    pub fn action_from_vector(v: &Vector2<f32>) -> [f32; 2] { [v.x, v.y] }

}
