//! Test utilities: fakes and fixture builders usable by unit and
//! integration tests alike.

pub mod fakes;

pub use fakes::{
    company_document, firm_relationship, funder_document, investment, person_document,
    FlakyGraphStore,
};
