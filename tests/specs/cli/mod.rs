mod clean;
mod command;
mod help;
mod infile;
