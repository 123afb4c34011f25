pub mod profile;
pub mod checksum;
pub mod sector;
pub mod store;
pub mod text;
pub mod mon;
pub mod pokedex;
pub mod items;
pub mod transcoder;
pub mod save;

pub use profile::{FormatProfile, FormatVersion, PROFILE_V1, PROFILE_V2};
pub use sector::{RegionName, SectorError};
pub use store::{assemble, serialize, RegionSet};
pub use mon::{PokemonRecord, MonError};
pub use transcoder::{GameStateSnapshot, Mutation, TranscodeError};
pub use save::SaveFile;
