//! Block materials the region scanner cares about.
//!
//! Names follow the `minecraft:` namespace. Wood and ore variants collapse
//! onto one material (every `*_log` is [`Material::Log`], deepslate ores
//! count as their stone counterparts). Anything unrecognised becomes
//! [`Material::Other`].

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    // Walk-through
    Air,
    CaveAir,
    Door,
    IronDoor,
    Trapdoor,
    Ladder,
    /// Placeholder for blocks of a tile that could not be captured.
    Unknown,

    // Resources
    Log,
    CoalOre,
    IronOre,
    GoldOre,
    RedstoneOre,
    DiamondOre,

    // Terrain and vegetation
    Bedrock,
    Stone,
    Deepslate,
    Granite,
    Diorite,
    Andesite,
    Dirt,
    GrassBlock,
    Gravel,
    Sand,
    Sandstone,
    Clay,
    Snow,
    Ice,
    Obsidian,
    MossyCobblestone,
    LapisOre,
    Water,
    Lava,
    Leaves,
    ShortGrass,
    Dandelion,
    Poppy,
    BrownMushroom,
    RedMushroom,
    MushroomBlock,
    Cactus,
    DeadBush,
    SugarCane,
    Vine,
    LilyPad,

    // Built
    Cobblestone,
    Planks,
    Fence,
    Glass,
    Torch,
    Bricks,
    Chest,
    CraftingTable,
    Furnace,
    Other,
}

impl Material {
    pub fn from_name(name: &str) -> Material {
        let id = name.strip_prefix("minecraft:").unwrap_or(name);
        let id = id.strip_prefix("deepslate_").filter(|rest| rest.ends_with("_ore")).unwrap_or(id);

        match id {
            "air" | "void_air" => Material::Air,
            "cave_air" => Material::CaveAir,
            "iron_door" => Material::IronDoor,
            "ladder" => Material::Ladder,
            "coal_ore" => Material::CoalOre,
            "iron_ore" => Material::IronOre,
            "gold_ore" => Material::GoldOre,
            "redstone_ore" => Material::RedstoneOre,
            "diamond_ore" => Material::DiamondOre,
            "lapis_ore" => Material::LapisOre,
            "bedrock" => Material::Bedrock,
            "stone" => Material::Stone,
            "deepslate" => Material::Deepslate,
            "granite" => Material::Granite,
            "diorite" => Material::Diorite,
            "andesite" => Material::Andesite,
            "dirt" | "coarse_dirt" => Material::Dirt,
            "grass_block" => Material::GrassBlock,
            "gravel" => Material::Gravel,
            "sand" | "red_sand" => Material::Sand,
            "sandstone" => Material::Sandstone,
            "clay" => Material::Clay,
            "snow" | "snow_block" => Material::Snow,
            "ice" | "packed_ice" => Material::Ice,
            "obsidian" => Material::Obsidian,
            "mossy_cobblestone" => Material::MossyCobblestone,
            "water" => Material::Water,
            "lava" => Material::Lava,
            "short_grass" | "tall_grass" | "fern" => Material::ShortGrass,
            "dandelion" => Material::Dandelion,
            "poppy" => Material::Poppy,
            "brown_mushroom" => Material::BrownMushroom,
            "red_mushroom" => Material::RedMushroom,
            "brown_mushroom_block" | "red_mushroom_block" | "mushroom_stem" => Material::MushroomBlock,
            "cactus" => Material::Cactus,
            "dead_bush" => Material::DeadBush,
            "sugar_cane" => Material::SugarCane,
            "vine" => Material::Vine,
            "lily_pad" => Material::LilyPad,
            "cobblestone" => Material::Cobblestone,
            "glass" => Material::Glass,
            "torch" | "wall_torch" => Material::Torch,
            "bricks" => Material::Bricks,
            "chest" => Material::Chest,
            "crafting_table" => Material::CraftingTable,
            "furnace" => Material::Furnace,
            _ if id.ends_with("_trapdoor") => Material::Trapdoor,
            _ if id.ends_with("_door") => Material::Door,
            _ if id.ends_with("_log") => Material::Log,
            _ if id.ends_with("_leaves") => Material::Leaves,
            _ if id.ends_with("_planks") => Material::Planks,
            _ if id.ends_with("_fence") => Material::Fence,
            _ => Material::Other,
        }
    }

    /// Canonical block name, used when rendering snapshots back to text.
    pub fn name(&self) -> &'static str {
        match self {
            Material::Air => "minecraft:air",
            Material::CaveAir => "minecraft:cave_air",
            Material::Door => "minecraft:oak_door",
            Material::IronDoor => "minecraft:iron_door",
            Material::Trapdoor => "minecraft:oak_trapdoor",
            Material::Ladder => "minecraft:ladder",
            Material::Unknown => "regiongrow:unknown",
            Material::Log => "minecraft:oak_log",
            Material::CoalOre => "minecraft:coal_ore",
            Material::IronOre => "minecraft:iron_ore",
            Material::GoldOre => "minecraft:gold_ore",
            Material::RedstoneOre => "minecraft:redstone_ore",
            Material::DiamondOre => "minecraft:diamond_ore",
            Material::Bedrock => "minecraft:bedrock",
            Material::Stone => "minecraft:stone",
            Material::Deepslate => "minecraft:deepslate",
            Material::Granite => "minecraft:granite",
            Material::Diorite => "minecraft:diorite",
            Material::Andesite => "minecraft:andesite",
            Material::Dirt => "minecraft:dirt",
            Material::GrassBlock => "minecraft:grass_block",
            Material::Gravel => "minecraft:gravel",
            Material::Sand => "minecraft:sand",
            Material::Sandstone => "minecraft:sandstone",
            Material::Clay => "minecraft:clay",
            Material::Snow => "minecraft:snow",
            Material::Ice => "minecraft:ice",
            Material::Obsidian => "minecraft:obsidian",
            Material::MossyCobblestone => "minecraft:mossy_cobblestone",
            Material::LapisOre => "minecraft:lapis_ore",
            Material::Water => "minecraft:water",
            Material::Lava => "minecraft:lava",
            Material::Leaves => "minecraft:oak_leaves",
            Material::ShortGrass => "minecraft:short_grass",
            Material::Dandelion => "minecraft:dandelion",
            Material::Poppy => "minecraft:poppy",
            Material::BrownMushroom => "minecraft:brown_mushroom",
            Material::RedMushroom => "minecraft:red_mushroom",
            Material::MushroomBlock => "minecraft:mushroom_stem",
            Material::Cactus => "minecraft:cactus",
            Material::DeadBush => "minecraft:dead_bush",
            Material::SugarCane => "minecraft:sugar_cane",
            Material::Vine => "minecraft:vine",
            Material::LilyPad => "minecraft:lily_pad",
            Material::Cobblestone => "minecraft:cobblestone",
            Material::Planks => "minecraft:oak_planks",
            Material::Fence => "minecraft:oak_fence",
            Material::Glass => "minecraft:glass",
            Material::Torch => "minecraft:torch",
            Material::Bricks => "minecraft:bricks",
            Material::Chest => "minecraft:chest",
            Material::CraftingTable => "minecraft:crafting_table",
            Material::Furnace => "minecraft:furnace",
            Material::Other => "minecraft:unknown_block",
        }
    }

    pub fn is_air(&self) -> bool {
        matches!(self, Material::Air | Material::CaveAir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_collapse() {
        assert_eq!(Material::from_name("minecraft:birch_log"), Material::Log);
        assert_eq!(Material::from_name("minecraft:spruce_log"), Material::Log);
        assert_eq!(Material::from_name("minecraft:deepslate_diamond_ore"), Material::DiamondOre);
        assert_eq!(Material::from_name("minecraft:deepslate"), Material::Deepslate);
        assert_eq!(Material::from_name("minecraft:spruce_trapdoor"), Material::Trapdoor);
        assert_eq!(Material::from_name("minecraft:dark_oak_door"), Material::Door);
        assert_eq!(Material::from_name("minecraft:iron_door"), Material::IronDoor);
    }

    #[test]
    fn test_unknown_names_are_other() {
        assert_eq!(Material::from_name("minecraft:beacon"), Material::Other);
        assert_eq!(Material::from_name("somemod:widget"), Material::Other);
    }

    #[test]
    fn test_names_resolve_back() {
        let samples = [
            Material::Air,
            Material::Log,
            Material::CoalOre,
            Material::GrassBlock,
            Material::Fence,
            Material::Trapdoor,
            Material::Leaves,
        ];
        for m in samples {
            assert_eq!(Material::from_name(m.name()), m, "{}", m.name());
        }
    }
}
