pub mod clock;
pub mod corpus;
pub mod dictionary;
pub mod game;
pub mod letters;
pub mod round;
pub mod scoring;
pub mod solver;
pub mod stats;
pub mod store;
