pub mod element;
pub mod observation;
pub mod station;

pub use observation::average_temperatures;
pub use station::{parse_inventory, Station};
