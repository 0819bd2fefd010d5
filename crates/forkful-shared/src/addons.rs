//! The closed catalog of add-on names.
//!
//! Add-ons are grouped by product family, but an add-on is accepted on any
//! order line as long as its name appears in at least one group.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddOnGroup {
    Pizza,
    Burger,
    Drink,
    General,
}

const PIZZA: &[&str] = &[
    "Extra Cheese",
    "Pepperoni",
    "Mushrooms",
    "Olives",
    "Bell Peppers",
    "Onions",
    "Bacon",
    "Chicken",
    "Sausage",
    "Jalapenos",
];

const BURGER: &[&str] = &[
    "Extra Patty",
    "Cheese Slice",
    "Bacon",
    "Avocado",
    "Fried Egg",
    "Caramelized Onions",
    "Extra Sauce",
    "Pickles",
    "Grilled Mushrooms",
];

const DRINK: &[&str] = &[
    "Extra Shot of Espresso",
    "Soy Milk",
    "Almond Milk",
    "Oat Milk",
    "Vanilla Syrup",
    "Caramel Syrup",
    "Whipped Cream",
];

const GENERAL: &[&str] = &[
    "Side Sauce",
    "Extra Dip",
    "Gluten-Free Option",
    "Vegan Option",
    "Spicy Level Upgrade",
];

impl AddOnGroup {
    pub const ALL: [AddOnGroup; 4] = [
        AddOnGroup::Pizza,
        AddOnGroup::Burger,
        AddOnGroup::Drink,
        AddOnGroup::General,
    ];

    pub fn names(self) -> &'static [&'static str] {
        match self {
            AddOnGroup::Pizza => PIZZA,
            AddOnGroup::Burger => BURGER,
            AddOnGroup::Drink => DRINK,
            AddOnGroup::General => GENERAL,
        }
    }

    pub fn contains(self, name: &str) -> bool {
        self.names().contains(&name.trim())
    }
}

pub fn is_known_add_on(name: &str) -> bool {
    AddOnGroup::ALL.iter().any(|g| g.contains(name))
}
