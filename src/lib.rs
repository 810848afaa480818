//! # Polysurrogate
//! ## Polynomial surrogates with the degree picked for you
//!
//! A surrogate model stands in for something expensive: a simulation, an experiment, a field
//! measurement. You give it a table of input parameters and one observed response; it gives you
//! back a cheap function that predicts the response at new inputs.
//!
//! This crate fits multivariate polynomial surrogates by ordinary least squares and chooses
//! their degree by repeated k-fold cross-validation:
//! - Every monomial of total degree `≤ D` over the `P` inputs is a column of the design matrix
//! - For each candidate degree, fits on all folds but one are scored on the held-out fold
//! - The degree with the lowest summed held-out error wins, and is refitted on all the data
//!
//! ```rust
//! use polysurrogate::{test::synthetic_observations, CrossValidation, SurrogateModel};
//!
//! // A response over two inputs, with a little measurement noise
//! let data = synthetic_observations(2, 200, -1.0..=1.0, 0.01, Some(42), |x| {
//!     1.0 + 2.0 * x[0] - x[0] * x[1] + 0.5 * x[1] * x[1]
//! });
//!
//! let cv = CrossValidation::default().with_epochs(2).with_folds(5).with_seed(7);
//! let model = SurrogateModel::construct(&data, &cv).expect("Failed to construct model");
//!
//! println!("{model}");
//! let z = model.y(&[0.5, -0.5]).unwrap();
//! assert!((z - 2.375).abs() < 0.05);
//! ```
//!
//! # Core Concepts
//! - [`Observations`] are the training rows: `P` input values and one response each.
//! - A [`basis::MonomialBasis`] lists every monomial of a given total degree in a fixed order.
//!     - It has `C(D + P, P)` columns, so the degree cannot exceed what the data can support.
//! - [`fit::least_squares`] fits one degree by solving the normal equations.
//! - [`CrossValidation`] configures the degree search: epochs, folds, candidate degrees,
//!   randomness, and what to do with degrees whose fits are singular.
//! - A [`SurrogateModel`] is the end product: coefficients, degree, and the selection report.
//!     - [`construct_model`] and [`evaluate`] are flat shortcuts returning and taking `(β, degree)`.
//! - [`table`] reads CSV training and evaluation tables and writes predictions.
//!
//! # Features
//! - `parallel`: scores the candidate degrees of each epoch on separate threads with rayon.
//!   Results are identical to the sequential search.
//!
//! # Testing utilities
//!
//! See [`test`] for assertion macros and synthetic data generators.
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]


pub mod basis;
pub mod display;
pub mod error;
pub mod fit;
pub mod partition;
pub mod selection;
pub mod statistics;
pub mod table;
pub mod value;

mod model;
mod observations;

pub use error::{Error, Result};
pub use model::{construct_model, evaluate, ModelProperties, SurrogateModel};
pub use observations::Observations;
pub use selection::{Aggregation, CrossValidation, DegreeRange, DegreeSelection, SingularPolicy};

pub use nalgebra;
