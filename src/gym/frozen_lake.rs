use std::{fmt, ops::Index, str::FromStr};

use log::{debug, trace};
use ndarray::s;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use strum::{EnumIter, FromRepr, IntoEnumIterator, VariantArray};

use crate::{
    error::{MdpError, Result},
    mdp::{DiscreteActionSpace, Environment, Mdp, MdpCore, ModelBuilder, Tensor3},
    util::check_interval,
};

/// The classic 4x4 map from gymnasium
pub const MAP_4X4: &str = "SFFF\nFHFH\nFFFH\nHFFG";

/// The classic 8x8 map from gymnasium
pub const MAP_8X8: &str = "SFFFFFFF\nFFFFFFFF\nFFFHFFFF\nFFFFFHFF\nFFFHFFFF\nFHHFFFHF\nFHFFHFHF\nFFFHFFFG";

#[derive(FromRepr, EnumIter, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Square {
    Frozen = 0,
    Hole = 1,
    Start = 2,
    Goal = 3,
}

impl Square {
    /// Holes and the goal end an episode
    pub fn is_terminal(self) -> bool {
        matches!(self, Square::Hole | Square::Goal)
    }
}

impl TryFrom<char> for Square {
    type Error = MdpError;

    fn try_from(value: char) -> Result<Self> {
        match value {
            'F' => Ok(Square::Frozen),
            'H' => Ok(Square::Hole),
            'S' => Ok(Square::Start),
            'G' => Ok(Square::Goal),
            c => Err(MdpError::InvalidLayout(format!("unknown square `{}`", c))),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Square::Frozen => 'F',
            Square::Hole => 'H',
            Square::Start => 'S',
            Square::Goal => 'G',
        };
        write!(f, "{}", c)
    }
}

/// Actions for the [`FrozenLake`] environment, also used as the four compass directions of the grid
#[derive(FromRepr, EnumIter, VariantArray, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FLAction {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
}

impl FLAction {
    /// The intended direction followed by the directions to its left and to its right,
    /// in the order the [`SlipDistribution`] weights them
    pub fn outcomes(self) -> [FLAction; 3] {
        use FLAction::*;
        match self {
            Up => [Up, Left, Right],
            Down => [Down, Right, Left],
            Left => [Left, Down, Up],
            Right => [Right, Up, Down],
        }
    }
}

/// Probability of moving in the intended direction, slipping to its left, and slipping to its right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlipDistribution(pub f64, pub f64, pub f64);

impl SlipDistribution {
    const TOLERANCE: f64 = 1e-9;

    /// Equal chance of each outcome, as on the slippery gymnasium lake
    pub fn uniform() -> Self {
        Self(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    }

    /// Always move in the intended direction
    pub fn deterministic() -> Self {
        Self(1.0, 0.0, 0.0)
    }

    pub fn weights(&self) -> [f64; 3] {
        [self.0, self.1, self.2]
    }

    /// **Errors** if any weight is outside `[0,1]` or the weights do not sum to 1
    pub fn validate(&self) -> Result<()> {
        let Self(intended, left, right) = *self;
        check_interval!(intended, 0.0, 1.0)?;
        check_interval!(left, 0.0, 1.0)?;
        check_interval!(right, 0.0, 1.0)?;

        let total = intended + left + right;
        ((total - 1.0).abs() <= Self::TOLERANCE)
            .then_some(())
            .ok_or_else(|| {
                MdpError::InvalidConfiguration(format!(
                    "slip distribution must sum to 1, got {}",
                    total
                ))
            })
    }
}

impl Default for SlipDistribution {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Configuration for the [`FrozenLake`] environment
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenLakeConfig {
    /// Side length of the square grid
    pub size: usize,
    pub slip: SlipDistribution,
    /// Fraction of cells turned into holes when generating a map
    pub hole_probability: f64,
    /// Reward for entering the goal
    pub goal_reward: f64,
    /// Reward for entering a hole
    pub hole_reward: f64,
    /// Seed for map generation, drawn from entropy when `None`
    pub seed: Option<u64>,
    /// Make holes and the goal self-loops with probability 1
    pub absorbing: bool,
}

impl Default for FrozenLakeConfig {
    fn default() -> Self {
        Self {
            size: 4,
            slip: SlipDistribution::uniform(),
            hole_probability: 0.2,
            goal_reward: 1.0,
            hole_reward: 0.0,
            seed: None,
            absorbing: false,
        }
    }
}

impl FrozenLakeConfig {
    /// Check every parameter used to generate a map and build its model
    pub fn validate(&self) -> Result<()> {
        check_map(self.size, self.hole_probability)?;
        self.validate_model()
    }

    /// Check the parameters used to build the model of an existing map
    fn validate_model(&self) -> Result<()> {
        self.slip.validate()?;
        self.validate_rewards()
    }

    fn validate_rewards(&self) -> Result<()> {
        for (name, reward) in [
            ("goal_reward", self.goal_reward),
            ("hole_reward", self.hole_reward),
        ] {
            if !reward.is_finite() {
                return Err(MdpError::InvalidConfiguration(format!(
                    "`{}` must be finite, got {}",
                    name, reward
                )));
            }
        }
        Ok(())
    }
}

fn check_map(size: usize, hole_probability: f64) -> Result<()> {
    if size < 2 {
        return Err(MdpError::InvalidConfiguration(format!(
            "`size` must be at least 2, got {}",
            size
        )));
    }
    check_interval!(hole_probability, 0.0, 1.0)
}

/// A square frozen lake map, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    size: usize,
    squares: Vec<Square>,
}

impl Layout {
    /// Generate a random map
    ///
    /// `round(size² * hole_probability)` distinct cells become holes and the last cell becomes the goal.
    /// The second cell and the second to last cell are always frozen, which makes a path from the
    /// first cell to the goal likely but does not guarantee one.
    ///
    /// **Errors** with [`MdpError::InvalidConfiguration`] if `size` is less than 2 or
    /// `hole_probability` is outside `[0,1]`
    pub fn generate<R: Rng + ?Sized>(
        size: usize,
        hole_probability: f64,
        rng: &mut R,
    ) -> Result<Self> {
        check_map(size, hole_probability)?;
        let n = size.checked_mul(size).ok_or_else(|| {
            MdpError::InvalidConfiguration(format!("`size` {} is too large", size))
        })?;
        let num_holes = ((n as f64) * hole_probability).round_ties_even() as usize;

        let mut squares = vec![Square::Frozen; n];
        for i in index::sample(rng, n, num_holes.min(n)) {
            squares[i] = Square::Hole;
        }
        squares[n - 1] = Square::Goal;
        squares[1] = Square::Frozen;
        squares[n - 2] = Square::Frozen;

        let layout = Self { size, squares };
        debug!(
            "Generated {size}x{size} map with {} holes",
            layout.holes().count()
        );
        Ok(layout)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn num_states(&self) -> usize {
        self.squares.len()
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Index of the start square, or the first cell if the map has none
    pub fn start(&self) -> usize {
        self.position(Square::Start).unwrap_or(0)
    }

    /// Index of the goal square
    pub fn goal(&self) -> usize {
        self.position(Square::Goal)
            .expect("layouts always contain a goal")
    }

    pub fn holes(&self) -> impl Iterator<Item = usize> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, &sq)| sq == Square::Hole)
            .map(|(i, _)| i)
    }

    fn position(&self, square: Square) -> Option<usize> {
        self.squares.iter().position(|&sq| sq == square)
    }

    /// The cell reached by moving from `x` in direction `dir`, or `x` itself if the move leaves the grid
    pub fn neighbor(&self, x: usize, dir: FLAction) -> usize {
        let size = self.size;
        match dir {
            FLAction::Left if x % size != 0 => x - 1,
            FLAction::Down if x + size < self.num_states() => x + size,
            FLAction::Right if x % size != size - 1 => x + 1,
            FLAction::Up if x >= size => x - size,
            _ => x,
        }
    }
}

impl Index<usize> for Layout {
    type Output = Square;

    fn index(&self, index: usize) -> &Self::Output {
        &self.squares[index]
    }
}

impl FromStr for Layout {
    type Err = MdpError;

    /// Parse a map with one row per line, using `S`, `F`, `H` and `G` for the squares
    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|row| !row.is_empty())
            .collect::<Vec<_>>();
        let size = rows.len();
        if size < 2 {
            return Err(MdpError::InvalidLayout(format!(
                "map must have at least 2 rows, got {}",
                size
            )));
        }

        let mut squares = Vec::with_capacity(size * size);
        for (i, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != size {
                return Err(MdpError::InvalidLayout(format!(
                    "row {} has {} squares, expected {}",
                    i, len, size
                )));
            }
            for c in row.chars() {
                squares.push(Square::try_from(c)?);
            }
        }

        let count = |square| squares.iter().filter(|&&sq| sq == square).count();
        if count(Square::Goal) != 1 {
            return Err(MdpError::InvalidLayout(
                "map must contain exactly one goal".into(),
            ));
        }
        if count(Square::Start) > 1 {
            return Err(MdpError::InvalidLayout(
                "map must contain at most one start".into(),
            ));
        }

        Ok(Self { size, squares })
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.squares.chunks(self.size).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for square in row {
                write!(f, "{}", square)?;
            }
        }
        Ok(())
    }
}

/// A tabular model of the frozen lake from Python [gymnasium](https://gymnasium.farama.org/)
///
/// The agent moves across a square grid of frozen cells towards a goal while avoiding holes.
/// The ice is slippery: an action moves the agent in the intended direction or in one of the two
/// perpendicular directions according to a [`SlipDistribution`]. Moves that would leave the grid
/// leave the agent in place.
///
/// The full transition tensor `P` and reward tensor `R` are built on construction and are
/// read-only afterwards. By default holes and the goal obey the same dynamics as frozen cells;
/// set [`FrozenLakeConfig::absorbing`] to trap the agent there instead.
#[derive(Debug, Clone)]
pub struct FrozenLake {
    core: MdpCore,
    layout: Layout,
}

impl FrozenLake {
    pub const NUM_ACTIONS: usize = 4;

    /// Generate a random map and build its model
    ///
    /// **Errors** with [`MdpError::InvalidConfiguration`] if any parameter of `config` is out of range
    pub fn new(config: FrozenLakeConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layout = Layout::generate(config.size, config.hole_probability, &mut rng)?;
        let core = MdpCore::new(layout.num_states(), Self::NUM_ACTIONS)?;

        Self::build(core, layout, &config)
    }

    /// Build the model of an existing map
    ///
    /// The size, hole probability and seed of `config` are ignored.
    pub fn from_layout(layout: Layout, config: &FrozenLakeConfig) -> Result<Self> {
        config.validate_model()?;
        let core = MdpCore::new(layout.num_states(), Self::NUM_ACTIONS)?;
        Self::build(core, layout, config)
    }

    fn build(core: MdpCore, layout: Layout, config: &FrozenLakeConfig) -> Result<Self> {
        let mut lake = Self { core, layout };
        lake.build_transition_model(config)?;
        lake.build_reward_model(config)?;
        debug!(
            "Built frozen lake model with {} states and {} actions",
            lake.core.num_states(),
            lake.core.num_actions()
        );
        Ok(lake)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

impl ModelBuilder<FrozenLakeConfig> for FrozenLake {
    fn build_transition_model(&mut self, config: &FrozenLakeConfig) -> Result<()> {
        config.slip.validate()?;
        let weights = config.slip.weights();
        let mut p = self.core.zeros();

        for x in 0..self.layout.num_states() {
            if config.absorbing && self.layout[x].is_terminal() {
                p.slice_mut(s![.., x, x]).fill(1.0);
                continue;
            }
            for action in FLAction::iter() {
                for (dir, w) in action.outcomes().into_iter().zip(weights) {
                    p[[action as usize, x, self.layout.neighbor(x, dir)]] += w;
                }
            }
        }

        trace!("Transition tensor:\n{:?}", p);
        self.core.p = Some(p);
        Ok(())
    }

    fn build_reward_model(&mut self, config: &FrozenLakeConfig) -> Result<()> {
        config.validate_rewards()?;
        let mut r = self.core.zeros();

        for (x, &square) in self.layout.squares().iter().enumerate() {
            let reward = match square {
                Square::Goal => config.goal_reward,
                Square::Hole => config.hole_reward,
                Square::Frozen | Square::Start => continue,
            };
            // Paid on entry only, not for staying in place
            r.slice_mut(s![.., .., x]).fill(reward);
            r.slice_mut(s![.., x, x]).fill(0.0);
        }

        self.core.r = Some(r);
        Ok(())
    }
}

impl Mdp for FrozenLake {
    fn num_states(&self) -> usize {
        self.core.num_states()
    }

    fn num_actions(&self) -> usize {
        self.core.num_actions()
    }

    fn transitions(&self) -> &Tensor3 {
        self.core
            .transitions()
            .expect("transition model is built on construction")
    }

    fn rewards(&self) -> &Tensor3 {
        self.core
            .rewards()
            .expect("reward model is built on construction")
    }
}

impl Environment for FrozenLake {
    type State = usize;
    type Action = FLAction;

    fn reset(&mut self) -> Self::State {
        self.layout.start()
    }

    fn step(&mut self, _action: Self::Action) -> Result<(Self::State, f64)> {
        Err(MdpError::Unsupported("stepping through a FrozenLake episode"))
    }
}

impl DiscreteActionSpace for FrozenLake {
    fn actions(&self) -> Vec<Self::Action> {
        FLAction::VARIANTS.to_vec()
    }
}
