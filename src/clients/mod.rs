pub mod google;
pub mod shikimori;
