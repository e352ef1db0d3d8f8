// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod dashboard;
pub mod error;
pub mod forms;
pub mod gateway;
pub mod ids;
pub mod list;
pub mod model;
pub mod navigation;
pub mod refresh;
pub mod related;

pub use dashboard::*;
pub use error::*;
pub use forms::*;
pub use gateway::*;
pub use ids::*;
pub use list::*;
pub use model::*;
pub use navigation::*;
pub use refresh::*;
pub use related::*;
