//! ELF image source.
//!
//! Every allocated section becomes a region; `SHT_NOBITS` sections such as
//! `.bss` are uninitialized. Named symbols from `.symtab` and `.dynsym` are
//! exported, except assembler mapping symbols which are treated as
//! default-generated.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use goblin::elf::Elf;
use goblin::elf::section_header::{SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHT_NOBITS};
use goblin::elf::sym::{STT_FILE, STT_SECTION, Symtab};
use goblin::strtab::Strtab;
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::{ImageSource, MemoryRegion, Permissions, Symbol, SymbolSource};

/// Image source backed by an ELF file held in memory.
#[derive(Debug, Clone)]
pub struct ElfImage {
    name: String,
    data: Vec<u8>,
    regions: Vec<MemoryRegion>,
    symbols: Vec<Symbol>,
    /// File offset of each region's contents, `None` for NOBITS sections.
    offsets: Vec<Option<u64>>,
}

impl ElfImage {
    /// Load and parse an ELF file.
    ///
    /// # Errors
    ///
    /// Returns `NoProgram` if the file cannot be read and `BinaryParse` if it
    /// is not a valid ELF image.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|e| Error::NoProgram(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("program");
        Self::parse(name, data)
    }

    /// Parse an ELF image from bytes.
    pub fn parse(name: &str, data: Vec<u8>) -> Result<Self> {
        let (regions, offsets, symbols) = {
            let elf = Elf::parse(&data)
                .map_err(|e| Error::BinaryParse(format!("Failed to parse ELF: {}", e)))?;
            let (regions, offsets) = collect_regions(&elf)?;
            let symbols = collect_symbols(&elf);
            (regions, offsets, symbols)
        };

        debug!(
            "Parsed ELF {}: {} sections, {} symbols",
            name,
            regions.len(),
            symbols.len()
        );

        Ok(Self {
            name: name.to_string(),
            data,
            regions,
            symbols,
            offsets,
        })
    }
}

fn collect_regions(elf: &Elf) -> Result<(Vec<MemoryRegion>, Vec<Option<u64>>)> {
    let mut regions = Vec::new();
    let mut offsets = Vec::new();

    for sh in &elf.section_headers {
        if sh.sh_flags & u64::from(SHF_ALLOC) == 0 || sh.sh_size == 0 {
            continue;
        }

        let name = elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string();
        let permissions = Permissions::new(
            true,
            sh.sh_flags & u64::from(SHF_WRITE) != 0,
            sh.sh_flags & u64::from(SHF_EXECINSTR) != 0,
        );
        let initialized = sh.sh_type != SHT_NOBITS;

        let region = MemoryRegion::with_size(name, sh.sh_addr, sh.sh_size, permissions)
            .map_err(|e| Error::BinaryParse(e.to_string()))?
            .initialized(initialized);

        regions.push(region);
        offsets.push(initialized.then_some(sh.sh_offset));
    }

    Ok((regions, offsets))
}

fn collect_symbols(elf: &Elf) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    push_symbols(&elf.syms, &elf.strtab, SymbolSource::Analysis, &mut seen, &mut symbols);
    push_symbols(&elf.dynsyms, &elf.dynstrtab, SymbolSource::Imported, &mut seen, &mut symbols);
    symbols
}

fn push_symbols(
    table: &Symtab,
    strtab: &Strtab,
    table_source: SymbolSource,
    seen: &mut HashSet<(u64, String)>,
    symbols: &mut Vec<Symbol>,
) {
    for sym in table.iter() {
        let kind = sym.st_type();
        if kind == STT_SECTION || kind == STT_FILE {
            continue;
        }
        // Undefined imports have no address in this image.
        if sym.st_shndx == 0 {
            continue;
        }
        let Some(name) = strtab.get_at(sym.st_name).filter(|n| !n.is_empty()) else {
            continue;
        };
        if !seen.insert((sym.st_value, name.to_string())) {
            continue;
        }

        let source = if is_mapping_symbol(name) {
            SymbolSource::Default
        } else {
            table_source
        };
        symbols.push(Symbol::new(sym.st_value, name, source));
    }
}

/// ARM/AArch64 mapping symbols (`$x`, `$d`, `$a`, `$t`, optionally `.suffix`).
pub fn is_mapping_symbol(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('$') else {
        return false;
    };
    let mut chars = rest.chars();
    matches!(chars.next(), Some('x' | 'd' | 'a' | 't'))
        && matches!(chars.next(), None | Some('.'))
}

impl ImageSource for ElfImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    fn read_region(&self, region: &MemoryRegion) -> Result<Vec<u8>> {
        let read_error = |message: String| Error::RegionRead {
            region: region.name.clone(),
            address: region.start,
            message,
        };

        let index = self
            .regions
            .iter()
            .position(|r| std::ptr::eq(r, region))
            .or_else(|| self.regions.iter().position(|r| r == region))
            .ok_or_else(|| read_error("Region not part of this image".to_string()))?;
        let offset = self.offsets[index]
            .ok_or_else(|| read_error("Section has no file contents".to_string()))?;

        let start = usize::try_from(offset)
            .map_err(|_| read_error(format!("File offset 0x{:X} too large", offset)))?;
        let end = usize::try_from(region.size())
            .ok()
            .and_then(|size| start.checked_add(size))
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                read_error(format!(
                    "Section contents 0x{:X}+0x{:X} extend past end of file (0x{:X})",
                    offset,
                    region.size(),
                    self.data.len()
                ))
            })?;

        Ok(self.data[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ELF_MAGIC;

    const SHT_PROGBITS: u32 = 1;
    const SHT_SYMTAB: u32 = 2;
    const SHT_STRTAB: u32 = 3;

    struct Section {
        name: u32,
        kind: u32,
        flags: u64,
        addr: u64,
        offset: u64,
        size: u64,
        link: u32,
        entsize: u64,
    }

    fn sym(name: u32, info: u8, shndx: u16, value: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(24);
        out.extend_from_slice(&name.to_le_bytes());
        out.push(info);
        out.push(0);
        out.extend_from_slice(&shndx.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes());
        out
    }

    /// Minimal ELF64 little-endian relocatable-style image with
    /// `.text`, `.bss`, `.shstrtab`, `.symtab` and `.strtab`.
    fn build_elf() -> Vec<u8> {
        let shstrtab = b"\0.text\0.bss\0.shstrtab\0.symtab\0.strtab\0".to_vec();
        let strtab = b"\0init_fn\0$x\0main.c\0".to_vec();
        let text = vec![0x1F, 0x20, 0x03, 0xD5, 0xC0, 0x03, 0x5F, 0xD6];

        let mut symtab = sym(0, 0, 0, 0);
        symtab.extend(sym(1, 0x12, 1, 0x1000)); // init_fn: GLOBAL FUNC
        symtab.extend(sym(9, 0x00, 1, 0x1000)); // $x: LOCAL NOTYPE
        symtab.extend(sym(12, 0x04, 0xFFF1, 0)); // main.c: FILE
        symtab.extend(sym(0, 0x03, 1, 0x1000)); // SECTION

        let text_off = 64u64;
        let shstrtab_off = text_off + text.len() as u64;
        let symtab_off = shstrtab_off + shstrtab.len() as u64;
        let strtab_off = symtab_off + symtab.len() as u64;
        let shoff = strtab_off + strtab.len() as u64;

        let sections = [
            Section { name: 0, kind: 0, flags: 0, addr: 0, offset: 0, size: 0, link: 0, entsize: 0 },
            Section {
                name: 1,
                kind: SHT_PROGBITS,
                flags: 0x6, // ALLOC | EXECINSTR
                addr: 0x1000,
                offset: text_off,
                size: text.len() as u64,
                link: 0,
                entsize: 0,
            },
            Section {
                name: 7,
                kind: SHT_NOBITS,
                flags: 0x3, // WRITE | ALLOC
                addr: 0x2000,
                offset: shstrtab_off,
                size: 0x40,
                link: 0,
                entsize: 0,
            },
            Section {
                name: 12,
                kind: SHT_STRTAB,
                flags: 0,
                addr: 0,
                offset: shstrtab_off,
                size: shstrtab.len() as u64,
                link: 0,
                entsize: 0,
            },
            Section {
                name: 22,
                kind: SHT_SYMTAB,
                flags: 0,
                addr: 0,
                offset: symtab_off,
                size: symtab.len() as u64,
                link: 5,
                entsize: 24,
            },
            Section {
                name: 30,
                kind: SHT_STRTAB,
                flags: 0,
                addr: 0,
                offset: strtab_off,
                size: strtab.len() as u64,
                link: 0,
                entsize: 0,
            },
        ];

        let mut out = Vec::new();
        out.extend_from_slice(ELF_MAGIC);
        out.extend_from_slice(&[2, 1, 1, 0]); // ELFCLASS64, LSB, version, SYSV
        out.extend_from_slice(&[0; 8]);
        out.extend_from_slice(&1u16.to_le_bytes()); // ET_REL
        out.extend_from_slice(&183u16.to_le_bytes()); // EM_AARCH64
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes()); // entry
        out.extend_from_slice(&0u64.to_le_bytes()); // phoff
        out.extend_from_slice(&shoff.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // flags
        out.extend_from_slice(&64u16.to_le_bytes()); // ehsize
        out.extend_from_slice(&56u16.to_le_bytes()); // phentsize
        out.extend_from_slice(&0u16.to_le_bytes()); // phnum
        out.extend_from_slice(&64u16.to_le_bytes()); // shentsize
        out.extend_from_slice(&(sections.len() as u16).to_le_bytes());
        out.extend_from_slice(&3u16.to_le_bytes()); // shstrndx
        assert_eq!(out.len(), 64);

        out.extend_from_slice(&text);
        out.extend_from_slice(&shstrtab);
        out.extend_from_slice(&symtab);
        out.extend_from_slice(&strtab);
        assert_eq!(out.len() as u64, shoff);

        for s in &sections {
            out.extend_from_slice(&s.name.to_le_bytes());
            out.extend_from_slice(&s.kind.to_le_bytes());
            out.extend_from_slice(&s.flags.to_le_bytes());
            out.extend_from_slice(&s.addr.to_le_bytes());
            out.extend_from_slice(&s.offset.to_le_bytes());
            out.extend_from_slice(&s.size.to_le_bytes());
            out.extend_from_slice(&s.link.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // info
            out.extend_from_slice(&1u64.to_le_bytes()); // addralign
            out.extend_from_slice(&s.entsize.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_parse_sections_as_regions() {
        let image = ElfImage::parse("test.o", build_elf()).unwrap();

        assert_eq!(image.regions().len(), 2);
        let text = &image.regions()[0];
        assert_eq!(text.name, ".text");
        assert_eq!(text.start, 0x1000);
        assert_eq!(text.end, 0x1007);
        assert_eq!(text.permissions, Permissions::READ_EXECUTE);
        assert!(text.initialized);

        let bss = &image.regions()[1];
        assert_eq!(bss.name, ".bss");
        assert_eq!(bss.permissions, Permissions::READ_WRITE);
        assert!(!bss.initialized);
    }

    #[test]
    fn test_read_section_contents() {
        let image = ElfImage::parse("test.o", build_elf()).unwrap();
        let text = image.read_region(&image.regions()[0]).unwrap();
        assert_eq!(text, vec![0x1F, 0x20, 0x03, 0xD5, 0xC0, 0x03, 0x5F, 0xD6]);

        assert!(image.read_region(&image.regions()[1]).is_err());
    }

    #[test]
    fn test_symbols() {
        let image = ElfImage::parse("test.o", build_elf()).unwrap();
        let symbols = image.symbols();

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "init_fn");
        assert_eq!(symbols[0].address, 0x1000);
        assert_eq!(symbols[0].source, SymbolSource::Analysis);
        assert_eq!(symbols[1].name, "$x");
        assert!(symbols[1].is_default_generated());
    }

    #[test]
    fn test_not_elf() {
        let result = ElfImage::parse("junk", vec![0u8; 128]);
        assert!(matches!(result, Err(Error::BinaryParse(_))));
    }

    #[test]
    fn test_mapping_symbols() {
        assert!(is_mapping_symbol("$x"));
        assert!(is_mapping_symbol("$d.42"));
        assert!(!is_mapping_symbol("$xyz"));
        assert!(!is_mapping_symbol("x"));
        assert!(!is_mapping_symbol("$"));
    }
}
