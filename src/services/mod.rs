pub mod csv_loader;
pub mod excel_loader;
pub mod profiler;
pub mod refine;
pub mod render;
pub mod source;
