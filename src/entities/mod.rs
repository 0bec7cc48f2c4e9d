pub mod company;
pub mod damage_record;
pub mod id_sequence;
pub mod product;
