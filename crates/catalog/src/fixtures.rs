use std::sync::Arc;

use ecoswap_core::domain::cart::{Cart, CartItem};
use ecoswap_core::domain::product::{Breakdown, EcoScore, Product};
use ecoswap_core::errors::DomainError;

use crate::memory::{InMemoryCatalogSource, InMemoryEcoScoreSource, InMemoryProductSource};

/// Everyday products a shopper is likely to have in the cart.
const SHOP_PRODUCTS: &[ProductSeed] = &[
    ProductSeed {
        id: "shop-toothbrush",
        name: "Plastic Toothbrush",
        brand: "BrightSmile",
        material: "Plastic",
        packaging: "Blister pack",
        eco_score: 40,
        carbon_kg: Some(9.0),
        water_liters: Some(700.0),
        certifications: &[],
        eco_tip: Some("Handles made from plastic take centuries to break down."),
    },
    ProductSeed {
        id: "shop-bottle",
        name: "Plastic Water Bottle",
        brand: "AquaPure",
        material: "Plastic",
        packaging: "Shrink wrap",
        eco_score: 35,
        carbon_kg: None,
        water_liters: None,
        certifications: &[],
        eco_tip: None,
    },
    ProductSeed {
        id: "shop-tote",
        name: "Cotton Tote Bag",
        brand: "ShopCo",
        material: "Cotton",
        packaging: "None",
        eco_score: 55,
        carbon_kg: Some(6.0),
        water_liters: Some(2500.0),
        certifications: &[],
        eco_tip: Some("Conventional cotton is water intensive."),
    },
    ProductSeed {
        id: "shop-detergent",
        name: "Laundry Detergent Pods",
        brand: "CleanCo",
        material: "PVA Film",
        packaging: "Plastic tub",
        eco_score: 88,
        carbon_kg: None,
        water_liters: None,
        certifications: &["EU Ecolabel"],
        eco_tip: None,
    },
];

/// Greener listings the recommendation engine draws substitutes from.
const GREENER_CANDIDATES: &[ProductSeed] = &[
    ProductSeed {
        id: "green-bamboo-brush",
        name: "Bamboo Toothbrush",
        brand: "EcoBrush",
        material: "Bamboo",
        packaging: "Cardboard",
        eco_score: 90,
        carbon_kg: Some(5.0),
        water_liters: Some(150.0),
        certifications: &["FSC"],
        eco_tip: Some("Compost the handle once the bristles are removed."),
    },
    ProductSeed {
        id: "green-corn-brush",
        name: "Compostable Toothbrush",
        brand: "GreenSmile",
        material: "Cornstarch",
        packaging: "Paper sleeve",
        eco_score: 78,
        carbon_kg: Some(4.0),
        water_liters: Some(300.0),
        certifications: &[],
        eco_tip: None,
    },
    ProductSeed {
        id: "green-steel-bottle",
        name: "Recycled Steel Water Bottle",
        brand: "Hydro",
        material: "Recycled Steel",
        packaging: "Cardboard",
        eco_score: 82,
        carbon_kg: Some(3.5),
        water_liters: Some(90.0),
        certifications: &["B Corp"],
        eco_tip: Some("One bottle replaces hundreds of single-use ones."),
    },
    ProductSeed {
        id: "green-glass-bottle",
        name: "Glass Water Bottle",
        brand: "Clearwell",
        material: "Glass",
        packaging: "Cardboard",
        eco_score: 70,
        carbon_kg: None,
        water_liters: None,
        certifications: &[],
        eco_tip: None,
    },
    ProductSeed {
        id: "green-organic-tote",
        name: "Organic Cotton Tote Bag",
        brand: "TerraCarry",
        material: "Organic Cotton",
        packaging: "None",
        eco_score: 76,
        carbon_kg: Some(2.1),
        water_liters: Some(1200.0),
        certifications: &["GOTS", "Fairtrade"],
        eco_tip: None,
    },
    ProductSeed {
        id: "green-detergent-sheets",
        name: "Laundry Detergent Sheets",
        brand: "PureWash",
        material: "Paper",
        packaging: "Paper envelope",
        eco_score: 92,
        carbon_kg: None,
        water_liters: None,
        certifications: &["EU Ecolabel"],
        eco_tip: None,
    },
];

/// Cart used by the demo command and the end-to-end scenarios.
pub const DEMO_CART: &[&str] = &["shop-toothbrush", "shop-bottle", "shop-tote", "shop-detergent"];

struct ProductSeed {
    id: &'static str,
    name: &'static str,
    brand: &'static str,
    material: &'static str,
    packaging: &'static str,
    eco_score: u16,
    carbon_kg: Option<f64>,
    water_liters: Option<f64>,
    certifications: &'static [&'static str],
    eco_tip: Option<&'static str>,
}

impl ProductSeed {
    fn to_product(&self) -> Result<Product, DomainError> {
        let mut product = Product::new(
            self.id,
            self.name,
            self.brand,
            self.material,
            EcoScore::new(self.eco_score)?,
        )
        .with_packaging(self.packaging)
        .with_certifications(self.certifications.iter().copied());

        if self.carbon_kg.is_some() || self.water_liters.is_some() || self.eco_tip.is_some() {
            let certifications = product.certifications.clone();
            product = product.with_breakdown(Breakdown {
                water: self.water_liters,
                carbon: self.carbon_kg,
                packaging: Some(self.packaging.to_string()),
                certifications,
                eco_tip: self.eco_tip.map(str::to_string),
                ..Breakdown::default()
            });
        }
        Ok(product)
    }
}

/// The demo catalog: shop products plus the greener listings that may replace them.
#[derive(Clone, Debug)]
pub struct SeedCatalog {
    shop: Vec<Product>,
    candidates: Vec<Product>,
}

/// The three in-memory sources an analyzer needs, seeded from a [`SeedCatalog`].
#[derive(Clone)]
pub struct SeedSources {
    pub products: Arc<InMemoryProductSource>,
    pub catalog: Arc<InMemoryCatalogSource>,
    pub eco_scores: Arc<InMemoryEcoScoreSource>,
}

impl SeedCatalog {
    pub fn load() -> Result<Self, DomainError> {
        let shop = SHOP_PRODUCTS.iter().map(ProductSeed::to_product).collect::<Result<_, _>>()?;
        let candidates =
            GREENER_CANDIDATES.iter().map(ProductSeed::to_product).collect::<Result<_, _>>()?;
        Ok(Self { shop, candidates })
    }

    pub fn shop_products(&self) -> &[Product] {
        &self.shop
    }

    pub fn candidates(&self) -> &[Product] {
        &self.candidates
    }

    pub fn all_products(&self) -> impl Iterator<Item = &Product> {
        self.shop.iter().chain(self.candidates.iter())
    }

    pub fn demo_cart() -> Cart {
        DEMO_CART.iter().copied().map(CartItem::new).collect()
    }

    /// Every product is resolvable and scored; only the greener listings are candidates.
    pub fn sources(&self) -> SeedSources {
        SeedSources {
            products: Arc::new(InMemoryProductSource::from_products(self.all_products().cloned())),
            catalog: Arc::new(InMemoryCatalogSource::from_products(self.candidates.clone())),
            eco_scores: Arc::new(InMemoryEcoScoreSource::from_products(self.all_products())),
        }
    }
}
