//! Static product catalog: the ten fixed categories, their product lists,
//! price ranges, and the payment methods a sale may carry.
//!
//! The catalog is advisory for cleaned data. Imputation may assign a
//! category-consistent product that is not list-exact, and records sourced
//! from a snapshot are never rejected for an unknown label.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    pub id:          u32,
    pub name:        &'static str,
    pub description: &'static str,
    pub products:    &'static [&'static str],
    pub min_price:   f64,
    pub max_price:   f64,
}

pub static CATEGORIES: [CategorySpec; 10] = [
    CategorySpec {
        id: 1,
        name: "Electronics",
        description: "Electronic devices and accessories",
        products: &["Laptop", "Smartphone", "Tablet", "Headphones", "Monitor", "Keyboard", "Mouse", "Camera"],
        min_price: 500.0,
        max_price: 5000.0,
    },
    CategorySpec {
        id: 2,
        name: "Clothing",
        description: "Apparel and fashion",
        products: &["T-shirt", "Trousers", "Dress", "Shirt", "Jacket", "Shoes", "Bag", "Hat"],
        min_price: 50.0,
        max_price: 500.0,
    },
    CategorySpec {
        id: 3,
        name: "Books",
        description: "Books and magazines",
        products: &["Novel", "Science Fiction", "History", "Biography", "Self-Help", "Children's Book", "Magazine", "Textbook"],
        min_price: 20.0,
        max_price: 150.0,
    },
    CategorySpec {
        id: 4,
        name: "Sports",
        description: "Sports equipment and wear",
        products: &["Football", "Running Shoes", "Fitness Equipment", "Bicycle", "Swim Goggles", "Tennis Racket", "Yoga Mat", "Sports Bag"],
        min_price: 100.0,
        max_price: 2000.0,
    },
    CategorySpec {
        id: 5,
        name: "Home & Living",
        description: "Furniture and home decoration",
        products: &["Furniture", "Kitchenware", "Bedspread", "Lighting", "Decoration", "Rug", "Curtain", "Home Textile"],
        min_price: 100.0,
        max_price: 3000.0,
    },
    CategorySpec {
        id: 6,
        name: "Cosmetics",
        description: "Cosmetics and personal care",
        products: &["Perfume", "Lipstick", "Foundation", "Shampoo", "Cream", "Sunscreen", "Makeup Kit", "Hair Care"],
        min_price: 30.0,
        max_price: 300.0,
    },
    CategorySpec {
        id: 7,
        name: "Toys",
        description: "Toys and games for children",
        products: &["Building Blocks", "Plush Toy", "Puzzle", "Game Console", "Board Game", "Doll", "RC Car", "Educational Toy"],
        min_price: 50.0,
        max_price: 500.0,
    },
    CategorySpec {
        id: 8,
        name: "Garden",
        description: "Garden equipment and plants",
        products: &["Plant", "Garden Furniture", "Lawn Mower", "Irrigation System", "Seeds", "Flower Pot", "Garden Tools", "Fertilizer"],
        min_price: 100.0,
        max_price: 2000.0,
    },
    CategorySpec {
        id: 9,
        name: "Automotive",
        description: "Vehicle accessories and care",
        products: &["Car Accessory", "Car Air Freshener", "Tyre", "Motor Oil", "Car Care Kit", "Navigation Device", "Car Charger", "Seat Cover"],
        min_price: 50.0,
        max_price: 1000.0,
    },
    CategorySpec {
        id: 10,
        name: "Stationery",
        description: "Office and school supplies",
        products: &["Pen", "Notebook", "Folder", "Calculator", "Bag", "Calendar", "Planner", "Paint Set"],
        min_price: 5.0,
        max_price: 100.0,
    },
];

pub static PAYMENT_METHODS: [&str; 5] = [
    "Credit Card",
    "Bank Transfer",
    "Cash on Delivery",
    "Mobile Payment",
    "Cryptocurrency",
];

pub fn category(name: &str) -> Option<&'static CategorySpec> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Whether `product` is listed under `category_name`.
pub fn belongs_to(product: &str, category_name: &str) -> bool {
    category(category_name).is_some_and(|c| c.products.contains(&product))
}

/// Category row as it appears in the snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryEntry {
    pub id:          u32,
    pub name:        String,
    pub description: String,
}

pub fn category_entries() -> Vec<CategoryEntry> {
    CATEGORIES
        .iter()
        .map(|c| CategoryEntry {
            id:          c.id,
            name:        c.name.to_string(),
            description: c.description.to_string(),
        })
        .collect()
}
