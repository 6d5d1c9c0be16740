//! Inventory items and equipped-weapon stat resolution.
//!
//! A weapon in the inventory is either defined inline or points at a catalog
//! entry. Either way it resolves to [`EquippedWeaponStats`], which combat uses
//! for attack and damage rolls. Stats are recomputed whenever the equipped
//! item or the wielder's abilities change.

use crate::catalog::{ReferenceCatalog, WeaponCategory};
use crate::character::{Ability, AbilityScores};
use crate::combat::DamageType;
use crate::dice::DiceExpression;
use crate::ids::ItemId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Armor,
    Shield,
    Accessory,
}

/// A weapon defined directly on the inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineWeapon {
    pub damage_dice: String,
    pub damage_type: DamageType,
    /// Magic bonus to attack and damage.
    pub attack_bonus: i32,
    pub category: Option<WeaponCategory>,
    pub finesse: bool,
    pub ranged: bool,
}

impl InlineWeapon {
    pub fn new(damage_dice: impl Into<String>, damage_type: DamageType) -> Self {
        Self {
            damage_dice: damage_dice.into(),
            damage_type,
            attack_bonus: 0,
            category: None,
            finesse: false,
            ranged: false,
        }
    }

    pub fn with_attack_bonus(mut self, bonus: i32) -> Self {
        self.attack_bonus = bonus;
        self
    }

    pub fn with_category(mut self, category: WeaponCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn finesse(mut self) -> Self {
        self.finesse = true;
        self
    }

    pub fn ranged(mut self) -> Self {
        self.ranged = true;
        self
    }
}

/// A weapon that points at a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogWeaponRef {
    pub source_item_id: String,
    /// Magic bonus to attack and damage (a +1 longsword has 1).
    pub magic_bonus: i32,
}

impl CatalogWeaponRef {
    pub fn new(source_item_id: impl Into<String>) -> Self {
        Self {
            source_item_id: source_item_id.into(),
            magic_bonus: 0,
        }
    }

    pub fn with_magic_bonus(mut self, bonus: i32) -> Self {
        self.magic_bonus = bonus;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponSource {
    Inline(InlineWeapon),
    Catalog(CatalogWeaponRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Gear,
    Weapon(WeaponSource),
}

/// An inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub equipped: bool,
    pub slot: Option<EquipmentSlot>,
    pub attuned: bool,
    pub kind: ItemKind,
}

impl InventoryItem {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            quantity: 1,
            equipped: false,
            slot: None,
            attuned: false,
            kind: ItemKind::Gear,
        }
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn equipped_in(mut self, slot: EquipmentSlot) -> Self {
        self.equipped = true;
        self.slot = Some(slot);
        self
    }

    pub fn is_weapon(&self) -> bool {
        matches!(self.kind, ItemKind::Weapon(_))
    }
}

/// The weapon the character is fighting with: the main-hand weapon if one is
/// equipped there, otherwise the first equipped weapon.
pub fn equipped_weapon(inventory: &[InventoryItem]) -> Option<&InventoryItem> {
    let mut equipped = inventory.iter().filter(|i| i.equipped && i.is_weapon());
    inventory
        .iter()
        .find(|i| i.equipped && i.is_weapon() && i.slot == Some(EquipmentSlot::MainHand))
        .or_else(|| equipped.next())
}

/// Resolved numbers for attacking with a weapon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedWeaponStats {
    pub name: String,
    pub damage: DiceExpression,
    pub damage_type: DamageType,
    pub attack_bonus: i32,
    /// Ability modifier plus magic bonus. Never includes proficiency.
    pub damage_bonus: i32,
    pub finesse: bool,
    pub ranged: bool,
    pub proficient: bool,
}

impl EquippedWeaponStats {
    /// An unarmed strike: always proficient, 1 + STR damage.
    pub fn unarmed(scores: Option<&AbilityScores>, proficiency_bonus: i8) -> Self {
        let str_mod = scores.map_or(0, |s| s.modifier(Ability::Strength)) as i32;
        Self {
            name: "Unarmed Strike".to_string(),
            damage: DiceExpression::flat(1),
            damage_type: DamageType::Bludgeoning,
            attack_bonus: str_mod + proficiency_bonus as i32,
            damage_bonus: str_mod,
            finesse: false,
            ranged: false,
            proficient: true,
        }
    }

    /// Damage dice with the damage bonus folded in.
    pub fn damage_expression(&self) -> DiceExpression {
        DiceExpression::new(
            self.damage.count,
            self.damage.sides,
            self.damage.bonus + self.damage_bonus,
        )
    }
}

/// The ability modifier that governs a weapon.
pub fn governing_modifier(scores: &AbilityScores, finesse: bool, ranged: bool) -> i8 {
    let str_mod = scores.modifier(Ability::Strength);
    let dex_mod = scores.modifier(Ability::Dexterity);
    if finesse {
        str_mod.max(dex_mod)
    } else if ranged {
        dex_mod
    } else {
        str_mod
    }
}

fn trained_category(entry: &str) -> Option<WeaponCategory> {
    match entry.strip_suffix(" weapons").unwrap_or(entry) {
        "simple" => Some(WeaponCategory::Simple),
        "martial" => Some(WeaponCategory::Martial),
        _ => None,
    }
}

/// Whether a proficiency list covers a weapon: by name, by category, or by an
/// entry containing the weapon's name ("longswords" covers "Longsword").
pub fn is_proficient(
    proficiencies: &[String],
    weapon_name: &str,
    category: Option<WeaponCategory>,
) -> bool {
    let weapon = weapon_name.trim().to_lowercase();
    proficiencies.iter().any(|entry| {
        let entry = entry.trim().to_lowercase();
        if let (Some(trained), Some(category)) = (trained_category(&entry), category) {
            if trained.covers(category) {
                return true;
            }
        }
        !weapon.is_empty() && entry.contains(&weapon)
    })
}

struct WeaponProfile<'a> {
    name: &'a str,
    damage_dice: &'a str,
    damage_type: DamageType,
    category: Option<WeaponCategory>,
    finesse: bool,
    ranged: bool,
    magic_bonus: i32,
}

/// Resolve attack and damage numbers for an inventory weapon.
///
/// Returns `None` for non-weapons and when no damage dice can be determined
/// (unknown catalog id, empty or malformed dice).
pub fn resolve_weapon_stats<C: ReferenceCatalog + ?Sized>(
    item: &InventoryItem,
    catalog: &C,
    scores: &AbilityScores,
    proficiency_bonus: i8,
    proficiencies: &[String],
) -> Option<EquippedWeaponStats> {
    let ItemKind::Weapon(source) = &item.kind else {
        return None;
    };

    let profile = match source {
        WeaponSource::Inline(weapon) => WeaponProfile {
            name: &item.name,
            damage_dice: &weapon.damage_dice,
            damage_type: weapon.damage_type,
            category: weapon.category,
            finesse: weapon.finesse,
            ranged: weapon.ranged,
            magic_bonus: weapon.attack_bonus,
        },
        WeaponSource::Catalog(reference) => {
            let weapon = catalog.weapon(&reference.source_item_id)?;
            WeaponProfile {
                name: &weapon.name,
                damage_dice: &weapon.damage_dice,
                damage_type: weapon.damage_type,
                category: Some(weapon.category),
                finesse: weapon.is_finesse(),
                ranged: weapon.is_ranged(),
                magic_bonus: reference.magic_bonus,
            }
        }
    };

    let damage = DiceExpression::parse_strict(profile.damage_dice).ok()?;
    let ability_mod = governing_modifier(scores, profile.finesse, profile.ranged) as i32;
    let proficient = is_proficient(proficiencies, profile.name, profile.category);
    let proficiency = if proficient {
        proficiency_bonus as i32
    } else {
        0
    };

    Some(EquippedWeaponStats {
        name: item.name.clone(),
        damage,
        damage_type: profile.damage_type,
        attack_bonus: ability_mod + proficiency + profile.magic_bonus,
        damage_bonus: ability_mod + profile.magic_bonus,
        finesse: profile.finesse,
        ranged: profile.ranged,
        proficient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StandardCatalog;
    use crate::ids::SequentialIds;

    fn profs(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    fn catalog_item(ids: &mut SequentialIds, name: &str, source: &str) -> InventoryItem {
        InventoryItem::new(ItemId::generate(ids), name)
            .with_kind(ItemKind::Weapon(WeaponSource::Catalog(CatalogWeaponRef::new(
                source,
            ))))
            .equipped_in(EquipmentSlot::MainHand)
    }

    #[test]
    fn test_proficiency_by_category() {
        let martial = profs(&["Martial Weapons"]);
        assert!(is_proficient(&martial, "Longsword", Some(WeaponCategory::Martial)));
        assert!(is_proficient(&martial, "Club", Some(WeaponCategory::Simple)));

        let simple = profs(&["simple"]);
        assert!(is_proficient(&simple, "Club", Some(WeaponCategory::Simple)));
        assert!(!is_proficient(&simple, "Longsword", Some(WeaponCategory::Martial)));
    }

    #[test]
    fn test_proficiency_by_name() {
        let list = profs(&["Longswords", "rapier"]);
        assert!(is_proficient(&list, "Longsword", Some(WeaponCategory::Martial)));
        assert!(is_proficient(&list, "Rapier", Some(WeaponCategory::Martial)));
        assert!(!is_proficient(&list, "Greataxe", Some(WeaponCategory::Martial)));
        assert!(!is_proficient(&list, "", None));
    }

    #[test]
    fn test_finesse_takes_better_modifier() {
        let mut ids = SequentialIds::new();
        let scores = AbilityScores::new(10, 18, 10, 10, 10, 10);
        let stats = resolve_weapon_stats(
            &catalog_item(&mut ids, "Rapier", "rapier"),
            &StandardCatalog,
            &scores,
            2,
            &profs(&["martial weapons"]),
        )
        .unwrap();
        assert!(stats.finesse);
        assert_eq!(stats.attack_bonus, 6);
        assert_eq!(stats.damage_bonus, 4);
        assert_eq!(stats.damage, DiceExpression::new(1, 8, 0));
    }

    #[test]
    fn test_ranged_uses_dex_and_no_proficiency() {
        let mut ids = SequentialIds::new();
        let scores = AbilityScores::new(16, 12, 10, 10, 10, 10);
        let stats = resolve_weapon_stats(
            &catalog_item(&mut ids, "Longbow", "longbow"),
            &StandardCatalog,
            &scores,
            3,
            &profs(&["simple weapons"]),
        )
        .unwrap();
        assert!(stats.ranged);
        assert!(!stats.proficient);
        assert_eq!(stats.attack_bonus, 1);
        assert_eq!(stats.damage_bonus, 1);
    }

    #[test]
    fn test_inline_magic_weapon() {
        let mut ids = SequentialIds::new();
        let item = InventoryItem::new(ItemId::generate(&mut ids), "Flame Tongue")
            .with_kind(ItemKind::Weapon(WeaponSource::Inline(
                InlineWeapon::new("2d6", DamageType::Fire).with_attack_bonus(1),
            )))
            .equipped_in(EquipmentSlot::MainHand);
        let scores = AbilityScores::new(14, 10, 10, 10, 10, 10);

        let stats =
            resolve_weapon_stats(&item, &StandardCatalog, &scores, 2, &profs(&["flame tongue"]))
                .unwrap();
        assert_eq!(stats.attack_bonus, 2 + 2 + 1);
        assert_eq!(stats.damage_bonus, 2 + 1);
        assert_eq!(stats.damage_expression(), DiceExpression::new(2, 6, 3));
    }

    #[test]
    fn test_no_dice_is_none() {
        let mut ids = SequentialIds::new();
        let scores = AbilityScores::default();
        let unknown = catalog_item(&mut ids, "Lightsaber", "lightsaber");
        assert!(resolve_weapon_stats(&unknown, &StandardCatalog, &scores, 2, &[]).is_none());

        let blank = InventoryItem::new(ItemId::generate(&mut ids), "Stick").with_kind(
            ItemKind::Weapon(WeaponSource::Inline(InlineWeapon::new(
                "",
                DamageType::Bludgeoning,
            ))),
        );
        assert!(resolve_weapon_stats(&blank, &StandardCatalog, &scores, 2, &[]).is_none());

        let rope = InventoryItem::new(ItemId::generate(&mut ids), "Rope");
        assert!(resolve_weapon_stats(&rope, &StandardCatalog, &scores, 2, &[]).is_none());
    }

    #[test]
    fn test_equipped_weapon_prefers_main_hand() {
        let mut ids = SequentialIds::new();
        let mut offhand = catalog_item(&mut ids, "Dagger", "dagger");
        offhand.slot = Some(EquipmentSlot::OffHand);
        let main = catalog_item(&mut ids, "Shortsword", "shortsword");
        let stowed = InventoryItem {
            equipped: false,
            ..catalog_item(&mut ids, "Club", "club")
        };

        let inventory = vec![stowed.clone(), offhand.clone(), main.clone()];
        assert_eq!(equipped_weapon(&inventory).map(|i| i.name.as_str()), Some("Shortsword"));

        let inventory = vec![stowed.clone(), offhand];
        assert_eq!(equipped_weapon(&inventory).map(|i| i.name.as_str()), Some("Dagger"));

        assert!(equipped_weapon(&[stowed]).is_none());
    }

    #[test]
    fn test_unarmed_strike() {
        let scores = AbilityScores::new(16, 10, 10, 10, 10, 10);
        let stats = EquippedWeaponStats::unarmed(Some(&scores), 2);
        assert_eq!(stats.attack_bonus, 5);
        assert_eq!(stats.damage_expression(), DiceExpression::flat(4));
    }
}
