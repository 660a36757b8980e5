// Entity Models - the dimensions every ranking is computed over
//
// Each result is located by season, gender, category, event and pool.
// Genders, pools and strokes are closed sets (enums); categories and events
// are identified by their codes.

pub mod category;
pub mod event;
pub mod gender;
pub mod pool;
pub mod season;

pub use category::CategoryType;
pub use event::{EventType, StrokeType};
pub use gender::GenderType;
pub use pool::PoolType;
pub use season::{Season, SeasonCatalog};
