mod location;

pub use location::{format_coordinate, from_dms, to_dms, Hemisphere};
