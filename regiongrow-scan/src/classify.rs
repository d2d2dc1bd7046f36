use regiongrow_world::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Wood,
    Coal,
    Iron,
    Gold,
    Redstone,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockClass {
    /// Walkable without digging; the fill continues through it.
    PassThrough,
    Resource(Resource),
    /// Terrain, vegetation or liquid that occurs without players.
    Natural,
    PlayerModified,
}

pub fn classify(material: Material) -> BlockClass {
    use Material::*;

    match material {
        Air | CaveAir | Door | IronDoor | Trapdoor | Ladder | Unknown => BlockClass::PassThrough,

        Log => BlockClass::Resource(Resource::Wood),
        CoalOre => BlockClass::Resource(Resource::Coal),
        IronOre => BlockClass::Resource(Resource::Iron),
        GoldOre => BlockClass::Resource(Resource::Gold),
        RedstoneOre => BlockClass::Resource(Resource::Redstone),
        DiamondOre => BlockClass::Resource(Resource::Diamond),

        Bedrock | Stone | Deepslate | Granite | Diorite | Andesite | Dirt | GrassBlock | Gravel
        | Sand | Sandstone | Clay | Snow | Ice | Obsidian | MossyCobblestone | LapisOre | Water
        | Lava | Leaves | ShortGrass | Dandelion | Poppy | BrownMushroom | RedMushroom
        | MushroomBlock | Cactus | DeadBush | SugarCane | Vine | LilyPad => BlockClass::Natural,

        Cobblestone | Planks | Fence | Glass | Torch | Bricks | Chest | CraftingTable | Furnace
        | Other => BlockClass::PlayerModified,
    }
}
