/// Errors
pub mod error;

/// Markov decision processes and their construction hooks
pub mod mdp;

/// Concrete MDPs
pub mod gym;

/// Conversions to `burn` tensors
pub mod traits;

mod util;

pub use error::MdpError;
pub use mdp::{DiscreteActionSpace, Environment, Mdp, MdpCore, ModelBuilder, Tensor3};
