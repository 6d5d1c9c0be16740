//! Reference catalog of classes, weapons and spells.
//!
//! The engine only reads from the catalog. Hosts may supply their own
//! [`ReferenceCatalog`]; [`StandardCatalog`] carries a slice of the SRD so the
//! engine is usable out of the box.

use crate::character::CharacterClass;
use crate::class_data::ClassRules;
use crate::combat::DamageType;
use serde::{Deserialize, Serialize};

/// Read-only lookups into reference data, by id or name.
pub trait ReferenceCatalog {
    fn weapon(&self, id: &str) -> Option<&CatalogWeapon>;
    fn spell(&self, id: &str) -> Option<&CatalogSpell>;

    /// Hit die, saves, proficiencies and spellcasting for a class.
    fn class_rules(&self, class: CharacterClass) -> ClassRules {
        class.data()
    }
}

/// Weapon training category. Martial training covers simple weapons too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponCategory {
    Simple,
    Martial,
}

impl WeaponCategory {
    pub fn name(&self) -> &'static str {
        match self {
            WeaponCategory::Simple => "simple",
            WeaponCategory::Martial => "martial",
        }
    }

    /// Whether training in `self` covers a weapon of `other`.
    pub fn covers(&self, other: WeaponCategory) -> bool {
        match self {
            WeaponCategory::Martial => true,
            WeaponCategory::Simple => other == WeaponCategory::Simple,
        }
    }
}

/// Weapon properties per D&D 5e.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponProperty {
    Finesse,
    Light,
    Heavy,
    TwoHanded,
    Versatile(String),
    Thrown,
    Ammunition,
    Loading,
    Reach,
}

/// A weapon entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogWeapon {
    pub id: String,
    pub name: String,
    pub category: WeaponCategory,
    pub damage_dice: String,
    pub damage_type: DamageType,
    pub properties: Vec<WeaponProperty>,
    pub range: Option<(u32, u32)>,
}

impl CatalogWeapon {
    pub fn new(
        name: impl Into<String>,
        category: WeaponCategory,
        damage_dice: impl Into<String>,
        damage_type: DamageType,
    ) -> Self {
        let name = name.into();
        Self {
            id: slug(&name),
            name,
            category,
            damage_dice: damage_dice.into(),
            damage_type,
            properties: Vec::new(),
            range: None,
        }
    }

    pub fn with_properties(mut self, properties: Vec<WeaponProperty>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_range(mut self, normal: u32, long: u32) -> Self {
        self.range = Some((normal, long));
        self
    }

    pub fn is_finesse(&self) -> bool {
        self.properties.contains(&WeaponProperty::Finesse)
    }

    /// Ranged weapons fire ammunition. Thrown melee weapons are not ranged.
    pub fn is_ranged(&self) -> bool {
        self.properties.contains(&WeaponProperty::Ammunition)
    }
}

/// Spell metadata the rules care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSpell {
    pub id: String,
    pub name: String,
    /// 0 for cantrips.
    pub level: u8,
    pub classes: Vec<CharacterClass>,
    pub ritual: bool,
    pub concentration: bool,
}

impl CatalogSpell {
    pub fn new(name: impl Into<String>, level: u8, classes: Vec<CharacterClass>) -> Self {
        let name = name.into();
        Self {
            id: slug(&name),
            name,
            level,
            classes,
            ritual: false,
            concentration: false,
        }
    }

    pub fn concentration(mut self) -> Self {
        self.concentration = true;
        self
    }

    pub fn ritual(mut self) -> Self {
        self.ritual = true;
        self
    }

    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}

/// Lowercase, hyphen-separated id for a display name.
pub fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn matches_key(id: &str, name: &str, key: &str) -> bool {
    id == key || name.eq_ignore_ascii_case(key) || id == slug(key)
}

/// Built-in SRD reference data.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCatalog;

impl StandardCatalog {
    pub fn weapons(&self) -> &'static [CatalogWeapon] {
        WEAPONS.as_slice()
    }

    pub fn spells(&self) -> &'static [CatalogSpell] {
        SPELLS.as_slice()
    }

    pub fn spells_for_class(
        &self,
        class: CharacterClass,
    ) -> impl Iterator<Item = &'static CatalogSpell> {
        SPELLS.iter().filter(move |s| s.classes.contains(&class))
    }
}

impl ReferenceCatalog for StandardCatalog {
    fn weapon(&self, id: &str) -> Option<&CatalogWeapon> {
        WEAPONS.iter().find(|w| matches_key(&w.id, &w.name, id))
    }

    fn spell(&self, id: &str) -> Option<&CatalogSpell> {
        SPELLS.iter().find(|s| matches_key(&s.id, &s.name, id))
    }
}

// ============================================================================
// Weapons
// ============================================================================

lazy_static::lazy_static! {
    /// Standard D&D 5e weapons.
    static ref WEAPONS: Vec<CatalogWeapon> = {
        use DamageType::{Bludgeoning, Piercing, Slashing};
        use WeaponCategory::{Martial, Simple};
        use WeaponProperty::*;

        vec![
            // Simple Melee Weapons
            CatalogWeapon::new("Club", Simple, "1d4", Bludgeoning)
                .with_properties(vec![Light]),
            CatalogWeapon::new("Dagger", Simple, "1d4", Piercing)
                .with_properties(vec![Finesse, Light, Thrown])
                .with_range(20, 60),
            CatalogWeapon::new("Greatclub", Simple, "1d8", Bludgeoning)
                .with_properties(vec![TwoHanded]),
            CatalogWeapon::new("Handaxe", Simple, "1d6", Slashing)
                .with_properties(vec![Light, Thrown])
                .with_range(20, 60),
            CatalogWeapon::new("Javelin", Simple, "1d6", Piercing)
                .with_properties(vec![Thrown])
                .with_range(30, 120),
            CatalogWeapon::new("Mace", Simple, "1d6", Bludgeoning),
            CatalogWeapon::new("Quarterstaff", Simple, "1d6", Bludgeoning)
                .with_properties(vec![Versatile("1d8".to_string())]),
            CatalogWeapon::new("Sickle", Simple, "1d4", Slashing)
                .with_properties(vec![Light]),
            CatalogWeapon::new("Spear", Simple, "1d6", Piercing)
                .with_properties(vec![Thrown, Versatile("1d8".to_string())])
                .with_range(20, 60),

            // Simple Ranged Weapons
            CatalogWeapon::new("Light Crossbow", Simple, "1d8", Piercing)
                .with_properties(vec![Ammunition, Loading, TwoHanded])
                .with_range(80, 320),
            CatalogWeapon::new("Dart", Simple, "1d4", Piercing)
                .with_properties(vec![Finesse, Thrown])
                .with_range(20, 60),
            CatalogWeapon::new("Shortbow", Simple, "1d6", Piercing)
                .with_properties(vec![Ammunition, TwoHanded])
                .with_range(80, 320),
            CatalogWeapon::new("Sling", Simple, "1d4", Bludgeoning)
                .with_properties(vec![Ammunition])
                .with_range(30, 120),

            // Martial Melee Weapons
            CatalogWeapon::new("Battleaxe", Martial, "1d8", Slashing)
                .with_properties(vec![Versatile("1d10".to_string())]),
            CatalogWeapon::new("Greataxe", Martial, "1d12", Slashing)
                .with_properties(vec![Heavy, TwoHanded]),
            CatalogWeapon::new("Greatsword", Martial, "2d6", Slashing)
                .with_properties(vec![Heavy, TwoHanded]),
            CatalogWeapon::new("Longsword", Martial, "1d8", Slashing)
                .with_properties(vec![Versatile("1d10".to_string())]),
            CatalogWeapon::new("Maul", Martial, "2d6", Bludgeoning)
                .with_properties(vec![Heavy, TwoHanded]),
            CatalogWeapon::new("Rapier", Martial, "1d8", Piercing)
                .with_properties(vec![Finesse]),
            CatalogWeapon::new("Scimitar", Martial, "1d6", Slashing)
                .with_properties(vec![Finesse, Light]),
            CatalogWeapon::new("Shortsword", Martial, "1d6", Piercing)
                .with_properties(vec![Finesse, Light]),
            CatalogWeapon::new("Warhammer", Martial, "1d8", Bludgeoning)
                .with_properties(vec![Versatile("1d10".to_string())]),

            // Martial Ranged Weapons
            CatalogWeapon::new("Hand Crossbow", Martial, "1d6", Piercing)
                .with_properties(vec![Ammunition, Light, Loading])
                .with_range(30, 120),
            CatalogWeapon::new("Heavy Crossbow", Martial, "1d10", Piercing)
                .with_properties(vec![Ammunition, Heavy, Loading, TwoHanded])
                .with_range(100, 400),
            CatalogWeapon::new("Longbow", Martial, "1d8", Piercing)
                .with_properties(vec![Ammunition, Heavy, TwoHanded])
                .with_range(150, 600),
        ]
    };

    /// A slice of SRD spells, enough to exercise spell caps and concentration.
    static ref SPELLS: Vec<CatalogSpell> = {
        use CharacterClass::*;

        vec![
            // Cantrips
            CatalogSpell::new("Fire Bolt", 0, vec![Sorcerer, Wizard]),
            CatalogSpell::new("Sacred Flame", 0, vec![Cleric]),
            CatalogSpell::new("Eldritch Blast", 0, vec![Warlock]),
            CatalogSpell::new("Vicious Mockery", 0, vec![Bard]),
            CatalogSpell::new("Guidance", 0, vec![Cleric, Druid]).concentration(),

            // 1st level
            CatalogSpell::new("Bless", 1, vec![Cleric, Paladin]).concentration(),
            CatalogSpell::new("Cure Wounds", 1, vec![Bard, Cleric, Druid, Paladin, Ranger]),
            CatalogSpell::new("Detect Magic", 1, vec![Bard, Cleric, Druid, Paladin, Ranger, Sorcerer, Wizard])
                .concentration()
                .ritual(),
            CatalogSpell::new("Hex", 1, vec![Warlock]).concentration(),
            CatalogSpell::new("Hunter's Mark", 1, vec![Ranger]).concentration(),
            CatalogSpell::new("Magic Missile", 1, vec![Sorcerer, Wizard]),
            CatalogSpell::new("Shield", 1, vec![Sorcerer, Wizard]),

            // 2nd level
            CatalogSpell::new("Hold Person", 2, vec![Bard, Cleric, Druid, Sorcerer, Warlock, Wizard])
                .concentration(),
            CatalogSpell::new("Misty Step", 2, vec![Sorcerer, Warlock, Wizard]),

            // 3rd level
            CatalogSpell::new("Fireball", 3, vec![Sorcerer, Wizard]),
            CatalogSpell::new("Haste", 3, vec![Sorcerer, Wizard]).concentration(),
            CatalogSpell::new("Spirit Guardians", 3, vec![Cleric]).concentration(),
        ]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Light Crossbow"), "light-crossbow");
        assert_eq!(slug("Hunter's Mark"), "hunter-s-mark");
    }

    #[test]
    fn test_lookup_by_id_or_name() {
        let catalog = StandardCatalog;
        assert_eq!(catalog.weapon("longsword").map(|w| w.damage_dice.as_str()), Some("1d8"));
        assert!(catalog.weapon("Light Crossbow").is_some());
        assert!(catalog.weapon("light-crossbow").is_some());
        assert!(catalog.weapon("lightsaber").is_none());
        assert!(catalog.spell("Hold Person").is_some_and(|s| s.concentration));
    }

    #[test]
    fn test_ranged_excludes_thrown() {
        let catalog = StandardCatalog;
        assert!(catalog.weapon("longbow").is_some_and(|w| w.is_ranged()));
        assert!(catalog.weapon("dagger").is_some_and(|w| !w.is_ranged() && w.is_finesse()));
    }

    #[test]
    fn test_category_coverage() {
        assert!(WeaponCategory::Martial.covers(WeaponCategory::Simple));
        assert!(!WeaponCategory::Simple.covers(WeaponCategory::Martial));
    }

    struct HardyBards;

    impl ReferenceCatalog for HardyBards {
        fn weapon(&self, id: &str) -> Option<&CatalogWeapon> {
            StandardCatalog.weapon(id)
        }

        fn spell(&self, id: &str) -> Option<&CatalogSpell> {
            StandardCatalog.spell(id)
        }

        fn class_rules(&self, class: CharacterClass) -> ClassRules {
            let mut rules = class.data();
            if class == CharacterClass::Bard {
                rules.hit_die = crate::dice::DieType::D12;
            }
            rules
        }
    }

    #[test]
    fn test_class_rules_default_and_override() {
        let standard = StandardCatalog.class_rules(CharacterClass::Cleric);
        assert_eq!(standard, CharacterClass::Cleric.data());
        assert_eq!(standard.armor_proficiencies, ["light armor", "medium armor", "shields"]);

        let custom = HardyBards.class_rules(CharacterClass::Bard);
        assert_eq!(custom.hit_die, crate::dice::DieType::D12);
        assert_eq!(custom.skill_count, 3);
    }

    #[test]
    fn test_spells_for_class() {
        let catalog = StandardCatalog;
        assert!(catalog
            .spells_for_class(CharacterClass::Warlock)
            .any(|s| s.name == "Hex"));
        assert!(catalog.spells().iter().any(|s| s.ritual));
    }
}
