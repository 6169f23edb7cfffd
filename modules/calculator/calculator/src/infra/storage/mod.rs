pub mod entity;
pub mod file_repo;
pub mod mapper;


pub use file_repo::FileHistoryRepository;
