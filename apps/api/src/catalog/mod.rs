// Reference data shared by the job and profile services: categories, the
// skill taxonomy and its polymorphic join, slug-keyed locations, companies.

pub mod companies;
pub mod handlers;
pub mod locations;
pub mod skills;
pub mod slug;
