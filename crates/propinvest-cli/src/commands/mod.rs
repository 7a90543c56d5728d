pub mod costs;
pub mod loan;
pub mod scenario;
pub mod solver;
