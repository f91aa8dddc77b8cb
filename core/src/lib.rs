pub mod corpus;
pub mod dates;
pub mod normalize;
pub mod persist;
pub mod vector;
