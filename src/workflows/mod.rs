pub mod leads;
pub mod nurture;
