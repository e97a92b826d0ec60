mod declaration;
mod expression;
mod statement;
mod type_name;

pub use self::declaration::*;
pub use self::expression::*;
pub use self::statement::*;
pub use self::type_name::*;
