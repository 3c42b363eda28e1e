mod harness;

mod add_test;
mod change_signature;
mod extract;
mod fill;
mod imports;
mod inline;
mod rewrites;
mod stubs;
