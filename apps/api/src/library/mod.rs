// The user's saved material: generated captions, the brand voice, the
// scheduling overlay on captions, and linked social accounts.

pub mod brand_voice;
pub mod captions;
pub mod schedule;
pub mod social;
