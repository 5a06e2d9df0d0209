//! Test support for the covjson workspace: synthetic CoverageJSON
//! documents, value generators and scratch directories.
//!
//! ```ignore
//! use test_utils::{trajectory_collection, GridFixture};
//!
//! let grid = GridFixture::new(16, 14).with_times(13).with_parameter("TMP", Some("K")).build();
//! let tracks = trajectory_collection(221, 24, Some(10));
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Asserts `|left - right| <= epsilon`, comparing as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= epsilon,
            "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
            left,
            right,
            diff,
            epsilon
        );
    }};
}
