mod fs_reference_library;

pub use fs_reference_library::FsReferenceLibrary;
