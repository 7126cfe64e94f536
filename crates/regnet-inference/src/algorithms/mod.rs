pub mod cv;
pub mod lasso;

pub use cv::{KFold, LassoCv, LassoCvFit};
pub use lasso::{alpha_grid, CenteredData, DescentOutcome, LassoSolver};
