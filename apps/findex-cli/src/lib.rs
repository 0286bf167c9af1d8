#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Collaborator implementations consumed by the binaries: the folder
//! scanner and the plain-text extractor. The engine crates only see these
//! through the `FileScanner` and `TextExtractor` seams.

pub mod extract;
pub mod scanner;
