pub mod additives;
pub mod fetch;
pub mod images;
pub mod menu;
pub mod processed;
pub mod raw;
pub mod schedule;

pub use additives::{AdditiveResolver, AdditiveStore, MemoryStore, StoreError};
pub use fetch::{fetch_with_fallback, SourceKind};
pub use images::ImageTable;
pub use menu::{group_menus, GroupError};
pub use processed::{
    Additive, AdditiveKind, DaySchedule, FoodProvider, Meal, Menu, ParseError, Role, TimeSegment,
    WeekSchedule,
};
pub use raw::{HoursEntry, MealDocument, ProviderDocument};
pub use schedule::extract_week;
