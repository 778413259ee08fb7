use ndarray::Array3;

use crate::error::{MdpError, Result};

/// Dense tensor indexed as `[action, state, next_state]`
pub type Tensor3 = Array3<f64>;

/// Represents a finite Markov decision process with a tabular model of its dynamics
///
/// The transition tensor `P[[a, s, s']]` holds the probability of landing in `s'` after taking
/// action `a` in state `s`, and the reward tensor `R[[a, s, s']]` the reward for that transition.
pub trait Mdp {
    /// Number of states in the state space
    fn num_states(&self) -> usize;

    /// Number of actions in the action space
    fn num_actions(&self) -> usize;

    /// The transition tensor `P`, shaped `[num_actions, num_states, num_states]`
    fn transitions(&self) -> &Tensor3;

    /// The reward tensor `R`, same shape as [`Mdp::transitions`]
    fn rewards(&self) -> &Tensor3;
}

/// Construction hooks populating an MDP's model in place
///
/// ### Type parameters
/// - `C`: The configuration record consumed by the hooks
pub trait ModelBuilder<C> {
    /// Populate the transition tensor `P`
    fn build_transition_model(&mut self, config: &C) -> Result<()>;

    /// Populate the reward tensor `R`
    fn build_reward_model(&mut self, config: &C) -> Result<()>;
}

/// Stepping capability of an MDP, kept separate from model construction
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;

    /// Advance the environment by one action
    ///
    /// **Returns** `(next_state, reward)`
    fn step(&mut self, action: Self::Action) -> Result<(Self::State, f64)>;
}

/// Environments with a finite set of actions
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions
    fn actions(&self) -> Vec<Self::Action>;
}

/// State shared by every concrete MDP: the sizes of its spaces and its model, once built
#[derive(Debug, Clone, PartialEq)]
pub struct MdpCore {
    num_states: usize,
    num_actions: usize,
    pub(crate) p: Option<Tensor3>,
    pub(crate) r: Option<Tensor3>,
}

impl MdpCore {
    /// Initialize an MDP with unset transition and reward tensors
    ///
    /// **Errors** with [`MdpError::InvalidConfiguration`] if either space is empty
    pub fn new(num_states: usize, num_actions: usize) -> Result<Self> {
        if num_states == 0 {
            return Err(MdpError::InvalidConfiguration(
                "`num_states` must be nonzero".into(),
            ));
        }
        if num_actions == 0 {
            return Err(MdpError::InvalidConfiguration(
                "`num_actions` must be nonzero".into(),
            ));
        }

        Ok(Self {
            num_states,
            num_actions,
            p: None,
            r: None,
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// A zeroed tensor of shape `[num_actions, num_states, num_states]`
    pub fn zeros(&self) -> Tensor3 {
        Tensor3::zeros((self.num_actions, self.num_states, self.num_states))
    }

    pub fn transitions(&self) -> Option<&Tensor3> {
        self.p.as_ref()
    }

    pub fn rewards(&self) -> Option<&Tensor3> {
        self.r.as_ref()
    }

    pub fn is_built(&self) -> bool {
        self.p.is_some() && self.r.is_some()
    }
}
