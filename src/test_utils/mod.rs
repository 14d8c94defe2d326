//! Mock transport and directory helpers shared by the unit tests

pub use mock_transport::*;
