pub mod benefit;
pub mod category;
pub mod child;
pub mod filter;

pub use benefit::{Benefit, BenefitInput, BenefitList, BenefitRow};
pub use category::{Category, CategoryInput, CategoryList};
pub use child::{Child, ChildInput, ChildList};
pub use filter::{AssociationRow, FilterRow};
