pub mod breadth;
pub mod comments;
pub mod items;
pub mod market;
pub mod settings;
pub mod watchlists;
