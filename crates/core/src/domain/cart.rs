use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self { product_id: ProductId::new(product_id) }
    }
}

/// Insertion-ordered set of cart items, unique by product id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the product is already in the cart.
    pub fn add(&mut self, item: CartItem) -> bool {
        if self.contains(&item.product_id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        self.items.len() != before
    }

    /// Replaces `old` with `replacement` at the same position. If `replacement` is already present
    /// the old entry is dropped instead, keeping ids unique.
    pub fn swap(&mut self, old: &ProductId, replacement: CartItem) -> bool {
        let Some(position) = self.items.iter().position(|item| &item.product_id == old) else {
            return false;
        };

        if old != &replacement.product_id && self.contains(&replacement.product_id) {
            self.items.remove(position);
        } else {
            self.items[position] = replacement;
        }
        true
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<T: IntoIterator<Item = CartItem>>(iter: T) -> Self {
        let mut cart = Cart::new();
        for item in iter {
            cart.add(item);
        }
        cart
    }
}
