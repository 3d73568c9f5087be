mod select;

pub use select::SelectBuilder;
