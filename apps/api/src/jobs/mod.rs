// Job postings: public search, detail views, and the employer-side lifecycle
// (create, partial update, feature/premium windows, close, cascading delete).

pub mod handlers;
pub mod lifecycle;
pub mod search;
pub mod validation;
