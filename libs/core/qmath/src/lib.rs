pub mod combinatorics;
pub mod num;
