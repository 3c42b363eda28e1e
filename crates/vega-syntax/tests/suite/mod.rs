mod parse_files;
mod printing;
